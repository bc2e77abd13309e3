//! Ethereum-style recoverable signatures over `Keccak256(message)`.
//!
//! Signatures are 65 bytes `r ∥ s ∥ v` with `v` the raw recovery id (0 or 1).
//! Recovery also accepts the legacy `27`/`28` encoding of `v`.

use bitcoin::secp256k1::PublicKey;

use super::curves::{require, CurveError, RecoverableSignature, Secp256k1Curve};
use crate::utils::crypto::keccak256;

pub const SIGNATURE_LEN: usize = 65;

pub fn sign_message(private_key: &[u8], message: &[u8]) -> Result<[u8; SIGNATURE_LEN], CurveError> {
    let (rs, recovery_id) = Secp256k1Curve::sign_recoverable(private_key, &keccak256(message))?;
    let mut out = [0u8; SIGNATURE_LEN];
    out[..64].copy_from_slice(&rs);
    out[64] = recovery_id;
    Ok(out)
}

/// Uncompressed (65-byte) public key of the signer
pub fn recover_public_key(message: &[u8], signature: &[u8]) -> Result<[u8; 65], CurveError> {
    require("signature", signature)?;
    if signature.len() != SIGNATURE_LEN {
        return Err(CurveError::InvalidSignature(format!(
            "expected {} bytes, got {}",
            SIGNATURE_LEN,
            signature.len()
        )));
    }
    let v = match signature[64] {
        27 | 28 => signature[64] - 27,
        v => v,
    };
    let compressed = Secp256k1Curve::recover_public_key(&keccak256(message), &signature[..64], v)?;
    let pk = PublicKey::from_slice(&compressed).map_err(|e| CurveError::InvalidPublicKey(e.to_string()))?;
    Ok(pk.serialize_uncompressed())
}

/// Recover the signer and compare with `public_key` (33 or 65 bytes).
pub fn verify_message(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool, CurveError> {
    let expected = Secp256k1Curve::parse_public_key(public_key)?;
    match recover_public_key(message, signature) {
        Ok(recovered) => Ok(recovered == expected.serialize_uncompressed()),
        Err(CurveError::InvalidSignature(_)) if signature.len() == SIGNATURE_LEN => Ok(false),
        Err(e) => Err(e),
    }
}
