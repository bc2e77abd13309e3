//! secp256k1 ECDSA
//!
//! Used by Bitcoin, Ethereum and Cosmos keys. Signatures are low-S
//! `r ∥ s`; verification normalizes S so high-S encodings from other
//! signers are still accepted.

use super::{require, CurveError, EcdsaSignature, RecoverableSignature, SignatureScheme};
use crate::utils::crypto::sha256;
use bitcoin::secp256k1::ecdsa::{RecoverableSignature as RecovSig, RecoveryId, Signature};
use bitcoin::secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

/// secp256k1 curve implementation
pub struct Secp256k1Curve;

impl Secp256k1Curve {
    pub(crate) fn parse_private_key(private_key: &[u8]) -> Result<SecretKey, CurveError> {
        require("private key", private_key)?;
        if private_key.len() != 32 {
            return Err(CurveError::InvalidPrivateKey(format!(
                "private key must be 32 bytes, got {}",
                private_key.len()
            )));
        }
        SecretKey::from_slice(private_key).map_err(|e| CurveError::InvalidPrivateKey(e.to_string()))
    }

    /// Compressed (33) or uncompressed (65) SEC1 encoding
    pub(crate) fn parse_public_key(public_key: &[u8]) -> Result<PublicKey, CurveError> {
        require("public key", public_key)?;
        PublicKey::from_slice(public_key).map_err(|e| CurveError::InvalidPublicKey(e.to_string()))
    }

    /// Verify separately supplied `r` and `s` scalars.
    pub fn verify_components(
        public_key: &[u8],
        message: &[u8],
        r: &[u8],
        s: &[u8],
    ) -> Result<bool, CurveError> {
        let sig = EcdsaSignature::from_components(r, s)?;
        Self::verify(public_key, message, &sig.to_bytes())
    }
}

impl SignatureScheme for Secp256k1Curve {
    type PrivateKey = Zeroizing<[u8; 32]>;
    type PublicKey = [u8; 33];
    type Signature = [u8; 64];

    fn generate_keypair() -> Result<(Self::PrivateKey, Self::PublicKey), CurveError> {
        let secp = Secp256k1::new();
        let mut bytes = Zeroizing::new([0u8; 32]);
        // Retry on the ~2^-128 chance of an out-of-range scalar
        loop {
            OsRng
                .try_fill_bytes(bytes.as_mut())
                .map_err(|e| CurveError::Generation(e.to_string()))?;
            if let Ok(sk) = SecretKey::from_slice(bytes.as_ref()) {
                let pk = PublicKey::from_secret_key(&secp, &sk);
                return Ok((bytes, pk.serialize()));
            }
        }
    }

    fn public_key_from_private(private_key: &[u8]) -> Result<Self::PublicKey, CurveError> {
        let secp = Secp256k1::new();
        let sk = Self::parse_private_key(private_key)?;
        Ok(PublicKey::from_secret_key(&secp, &sk).serialize())
    }

    fn sign(private_key: &[u8], message: &[u8]) -> Result<Self::Signature, CurveError> {
        let sk = Self::parse_private_key(private_key)?;
        require("message", message)?;

        let secp = Secp256k1::new();
        let msg = Message::from_digest(sha256(message));
        Ok(secp.sign_ecdsa(&msg, &sk).serialize_compact())
    }

    fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool, CurveError> {
        let pk = Self::parse_public_key(public_key)?;
        let components = EcdsaSignature::from_bytes(signature)?;

        let mut sig = Signature::from_compact(&components.to_bytes())
            .map_err(|e| CurveError::InvalidSignature(e.to_string()))?;
        sig.normalize_s();

        let secp = Secp256k1::new();
        let msg = Message::from_digest(sha256(message));
        Ok(secp.verify_ecdsa(&msg, &sig, &pk).is_ok())
    }
}

impl RecoverableSignature for Secp256k1Curve {
    fn sign_recoverable(private_key: &[u8], digest: &[u8; 32]) -> Result<([u8; 64], u8), CurveError> {
        let sk = Self::parse_private_key(private_key)?;
        let secp = Secp256k1::new();
        let msg = Message::from_digest(*digest);
        let (recovery_id, serialized) = secp.sign_ecdsa_recoverable(&msg, &sk).serialize_compact();
        Ok((serialized, recovery_id.to_i32() as u8))
    }

    fn recover_public_key(
        digest: &[u8; 32],
        signature: &[u8],
        recovery_id: u8,
    ) -> Result<Self::PublicKey, CurveError> {
        let components = EcdsaSignature::from_bytes(signature)?;
        let rec_id = RecoveryId::from_i32(recovery_id as i32)
            .map_err(|e| CurveError::InvalidSignature(format!("invalid recovery id: {}", e)))?;
        let sig = RecovSig::from_compact(&components.to_bytes(), rec_id)
            .map_err(|e| CurveError::InvalidSignature(e.to_string()))?;

        let secp = Secp256k1::new();
        let msg = Message::from_digest(*digest);
        let pk = secp
            .recover_ecdsa(&msg, &sig)
            .map_err(|e| CurveError::InvalidSignature(format!("recovery failed: {}", e)))?;
        Ok(pk.serialize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keypair() -> ([u8; 32], [u8; 33]) {
        let sk = [42u8; 32];
        let pk = Secp256k1Curve::public_key_from_private(&sk).unwrap();
        (sk, pk)
    }

    #[test]
    fn test_generate_keypair() {
        let (sk, pk) = Secp256k1Curve::generate_keypair().unwrap();
        assert_eq!(Secp256k1Curve::public_key_from_private(sk.as_ref()).unwrap(), pk);
        assert!(pk[0] == 0x02 || pk[0] == 0x03);
    }

    #[test]
    fn test_sign_verify() {
        let (sk, pk) = keypair();
        let message = b"Hello, secp256k1!";
        let signature = Secp256k1Curve::sign(&sk, message).unwrap();
        assert!(Secp256k1Curve::verify(&pk, message, &signature).unwrap());

        // Wrong message should fail
        assert!(!Secp256k1Curve::verify(&pk, b"Wrong message", &signature).unwrap());
    }

    #[test]
    fn test_flipped_signature_bit() {
        let (sk, pk) = keypair();
        let mut signature = Secp256k1Curve::sign(&sk, b"payload").unwrap();
        signature[63] ^= 0x01;
        assert!(!Secp256k1Curve::verify(&pk, b"payload", &signature).unwrap());
    }

    #[test]
    fn test_signs_sha256_of_message() {
        let (sk, pk) = keypair();
        let signature = Secp256k1Curve::sign(&sk, b"abc").unwrap();

        let secp = Secp256k1::new();
        let sig = Signature::from_compact(&signature).unwrap();
        let msg = Message::from_digest(sha256(b"abc"));
        let pk = PublicKey::from_slice(&pk).unwrap();
        assert!(secp.verify_ecdsa(&msg, &sig, &pk).is_ok());
    }

    #[test]
    fn test_uncompressed_public_key_accepted() {
        let (sk, _) = keypair();
        let secp = Secp256k1::new();
        let full = PublicKey::from_secret_key(&secp, &SecretKey::from_slice(&sk).unwrap())
            .serialize_uncompressed();
        let signature = Secp256k1Curve::sign(&sk, b"m").unwrap();
        assert!(Secp256k1Curve::verify(&full, b"m", &signature).unwrap());
    }

    #[test]
    fn test_components_and_high_s() {
        let (sk, pk) = keypair();
        let signature = Secp256k1Curve::sign(&sk, b"m").unwrap();
        assert!(Secp256k1Curve::verify_components(&pk, b"m", &signature[..32], &signature[32..]).unwrap());

        // n - s is the high-S twin of the same signature
        let high_s = SecretKey::from_slice(&signature[32..]).unwrap().negate().secret_bytes();
        assert_ne!(high_s[..], signature[32..]);
        assert!(Secp256k1Curve::verify_components(&pk, b"m", &signature[..32], &high_s).unwrap());
    }

    #[test]
    fn test_missing_inputs() {
        let (sk, pk) = keypair();
        assert!(matches!(Secp256k1Curve::sign(&[], b"m"), Err(CurveError::Validation(_))));
        assert!(matches!(Secp256k1Curve::sign(&sk, b""), Err(CurveError::Validation(_))));
        assert!(matches!(Secp256k1Curve::verify(&pk, b"m", &[]), Err(CurveError::Validation(_))));
        assert!(matches!(
            Secp256k1Curve::verify_components(&pk, b"m", &[], &[1]),
            Err(CurveError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_message_verifies() {
        let (sk, pk) = keypair();
        let signature = Secp256k1Curve::sign(&sk, b"m").unwrap();
        assert!(!Secp256k1Curve::verify(&pk, b"", &signature).unwrap());
        assert!(!Secp256k1Curve::verify_components(&pk, b"", &signature[..32], &signature[32..]).unwrap());
    }

    #[test]
    fn test_malformed_inputs() {
        let (sk, _) = keypair();
        let signature = Secp256k1Curve::sign(&sk, b"m").unwrap();
        assert!(matches!(
            Secp256k1Curve::verify(&[0x05; 33], b"m", &signature),
            Err(CurveError::InvalidPublicKey(_))
        ));
        // x >= p
        let mut off_curve = [0xffu8; 33];
        off_curve[0] = 0x02;
        assert!(matches!(
            Secp256k1Curve::verify(&off_curve, b"m", &signature),
            Err(CurveError::InvalidPublicKey(_))
        ));
        assert!(matches!(
            Secp256k1Curve::sign(&[0u8; 32], b"m"),
            Err(CurveError::InvalidPrivateKey(_))
        ));
    }

    #[test]
    fn test_recoverable_signature() {
        let (sk, pk) = keypair();
        let digest = [0xABu8; 32];
        let (signature, recovery_id) = Secp256k1Curve::sign_recoverable(&sk, &digest).unwrap();
        assert!(recovery_id < 4);
        let recovered = Secp256k1Curve::recover_public_key(&digest, &signature, recovery_id).unwrap();
        assert_eq!(pk, recovered);
    }
}
