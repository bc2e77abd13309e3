//! ECDSA over secp256k1 and NIST P-256
//!
//! Both curves sign `SHA256(message)` and produce a fixed 64-byte `r ∥ s`
//! signature. Verification failures are `Ok(false)`; only malformed keys or
//! signature encodings are errors.
//!
//! # Example
//!
//! ```rust,ignore
//! use keysmith::crypto::curves::{Secp256k1Curve, SignatureScheme};
//!
//! let (sk, pk) = Secp256k1Curve::generate_keypair()?;
//! let sig = Secp256k1Curve::sign(sk.as_ref(), b"hello")?;
//! assert!(Secp256k1Curve::verify(&pk, b"hello", &sig)?);
//! ```

pub mod secp256k1;
pub mod secp256r1;
pub mod traits;

pub use secp256k1::Secp256k1Curve;
pub use secp256r1::Secp256r1Curve;
pub use traits::*;

use crate::error::{ErrorCode, KeysmithError};

// MARK: - Curve Errors

/// Errors raised by the signature engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CurveError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
    #[error("Missing input: {0}")]
    Validation(String),
    #[error("Key generation failed: {0}")]
    Generation(String),
}

impl From<CurveError> for KeysmithError {
    fn from(e: CurveError) -> Self {
        let code = match e {
            CurveError::InvalidPrivateKey(_) => ErrorCode::InvalidPrivateKey,
            CurveError::InvalidPublicKey(_) => ErrorCode::CurvePoint,
            CurveError::InvalidSignature(_) => ErrorCode::InvalidSignature,
            CurveError::Validation(_) => ErrorCode::Validation,
            CurveError::Generation(_) => ErrorCode::Entropy,
        };
        KeysmithError::new(code, e.to_string())
    }
}

/// Reject an absent (empty) required input.
pub(crate) fn require(field: &str, value: &[u8]) -> Result<(), CurveError> {
    if value.is_empty() {
        return Err(CurveError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

// MARK: - Signature Components

/// ECDSA signature as its two scalars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcdsaSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl EcdsaSignature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CurveError> {
        require("signature", bytes)?;
        if bytes.len() != 64 {
            return Err(CurveError::InvalidSignature(format!(
                "signature must be 64 bytes, got {}",
                bytes.len()
            )));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Ok(Self { r, s })
    }

    /// Build from big-endian scalars of up to 32 bytes each; shorter values are left-padded.
    pub fn from_components(r: &[u8], s: &[u8]) -> Result<Self, CurveError> {
        require("signature r", r)?;
        require("signature s", s)?;
        Ok(Self {
            r: pad_scalar("r", r)?,
            s: pad_scalar("s", s)?,
        })
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.r);
        out[32..].copy_from_slice(&self.s);
        out
    }
}

fn pad_scalar(name: &str, value: &[u8]) -> Result<[u8; 32], CurveError> {
    if value.len() > 32 {
        return Err(CurveError::InvalidSignature(format!(
            "signature {} must be at most 32 bytes, got {}",
            name,
            value.len()
        )));
    }
    let mut out = [0u8; 32];
    out[32 - value.len()..].copy_from_slice(value);
    Ok(out)
}
