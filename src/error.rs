//! Unified error types for keysmith
//!
//! Every fallible operation in the crate returns a `KeysmithError` carrying
//! a machine-readable `ErrorCode`. Verification mismatches are not errors;
//! they surface as `Ok(false)`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all keysmith operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeysmithError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl KeysmithError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn invalid_mnemonic(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidMnemonic, msg)
    }

    pub fn invalid_seed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidSeed, msg)
    }

    pub fn invalid_hex(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidHex, msg)
    }

    pub fn checksum(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Checksum, msg)
    }

    pub fn unrecognized_format(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnrecognizedKeyFormat, msg)
    }

    pub fn curve_point(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::CurvePoint, msg)
    }

    pub fn invalid_private_key(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidPrivateKey, msg)
    }

    pub fn invalid_signature(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidSignature, msg)
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, msg)
    }

    pub fn unsupported_chain(name: &str) -> Self {
        Self::new(ErrorCode::UnsupportedChain, format!("unsupported chain: {}", name))
    }

    pub fn unsupported_algorithm(name: &str) -> Self {
        Self::new(
            ErrorCode::UnsupportedAlgorithm,
            format!("unsupported algorithm: {}", name),
        )
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Encoding, msg)
    }

    pub fn entropy(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Entropy, msg)
    }

    pub fn subscription(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Subscription, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }
}

impl fmt::Display for KeysmithError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for KeysmithError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Mnemonic and seed
    InvalidMnemonic,
    InvalidSeed,
    Entropy,

    // Key tree
    HardenedFromPublic,
    MaxDepthExceeded,
    InvalidChildIndex,
    UnsupportedChain,

    // Encodings
    InvalidHex,
    Checksum,
    UnrecognizedKeyFormat,
    Encoding,

    // Curves and signatures
    CurvePoint,
    InvalidPrivateKey,
    InvalidSignature,
    UnsupportedAlgorithm,

    // Input
    Validation,

    // Collaborators
    Subscription,

    Internal,
}

/// Result type alias for keysmith operations
pub type KeysmithResult<T> = Result<T, KeysmithError>;

// Conversions from common error types

impl From<hex::FromHexError> for KeysmithError {
    fn from(e: hex::FromHexError) -> Self {
        KeysmithError::new(ErrorCode::InvalidHex, e.to_string())
    }
}

impl From<bs58::decode::Error> for KeysmithError {
    fn from(e: bs58::decode::Error) -> Self {
        KeysmithError::new(ErrorCode::UnrecognizedKeyFormat, format!("base58: {}", e))
    }
}

impl From<bech32::Error> for KeysmithError {
    fn from(e: bech32::Error) -> Self {
        match e {
            bech32::Error::InvalidChecksum => {
                KeysmithError::new(ErrorCode::Checksum, "bech32 checksum mismatch")
            }
            other => KeysmithError::new(ErrorCode::Encoding, format!("bech32: {}", other)),
        }
    }
}

impl From<bip39::Error> for KeysmithError {
    fn from(e: bip39::Error) -> Self {
        KeysmithError::new(ErrorCode::InvalidMnemonic, format!("BIP39 error: {}", e))
    }
}

impl From<bitcoin::secp256k1::Error> for KeysmithError {
    fn from(e: bitcoin::secp256k1::Error) -> Self {
        use bitcoin::secp256k1::Error as SecpError;
        let code = match e {
            SecpError::InvalidSecretKey | SecpError::InvalidTweak => ErrorCode::InvalidPrivateKey,
            SecpError::InvalidSignature | SecpError::IncorrectSignature => {
                ErrorCode::InvalidSignature
            }
            SecpError::InvalidPublicKey => ErrorCode::CurvePoint,
            _ => ErrorCode::Internal,
        };
        KeysmithError::new(code, format!("secp256k1: {}", e))
    }
}

impl From<serde_json::Error> for KeysmithError {
    fn from(e: serde_json::Error) -> Self {
        KeysmithError::new(ErrorCode::Encoding, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = KeysmithError::new(ErrorCode::HardenedFromPublic, "cannot harden")
            .with_details("index 2147483648");

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("hardened_from_public"));
        assert!(json.contains("cannot harden"));
    }

    #[test]
    fn test_display_includes_code_and_details() {
        let err = KeysmithError::checksum("bad wif").with_details("expected 1a2b3c4d");
        assert_eq!(err.to_string(), "[Checksum] bad wif (expected 1a2b3c4d)");
    }

    #[test]
    fn test_hex_error_maps_to_invalid_hex() {
        let err: KeysmithError = hex::decode("zz").unwrap_err().into();
        assert_eq!(err.code, ErrorCode::InvalidHex);
    }

    #[test]
    fn test_bech32_checksum_maps_to_checksum() {
        let err: KeysmithError = bech32::Error::InvalidChecksum.into();
        assert_eq!(err.code, ErrorCode::Checksum);
    }
}
