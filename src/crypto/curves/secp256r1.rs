//! Secp256r1 (P-256/NIST) ECDSA
//!
//! Private keys are raw 32-byte scalars. Public keys are accepted as
//! compressed (33) or uncompressed (65) SEC1 points and emitted compressed.

use super::{require, CurveError, EcdsaSignature, SignatureScheme};
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::SecretKey;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

/// Secp256r1 (P-256) curve implementation
pub struct Secp256r1Curve;

impl Secp256r1Curve {
    fn parse_private_key(private_key: &[u8]) -> Result<SigningKey, CurveError> {
        require("private key", private_key)?;
        if private_key.len() != 32 {
            return Err(CurveError::InvalidPrivateKey(format!(
                "private key must be 32 bytes, got {}",
                private_key.len()
            )));
        }
        SigningKey::from_slice(private_key)
            .map_err(|e| CurveError::InvalidPrivateKey(format!("invalid P-256 scalar: {}", e)))
    }

    fn parse_public_key(public_key: &[u8]) -> Result<VerifyingKey, CurveError> {
        require("public key", public_key)?;
        match public_key.len() {
            33 | 65 => VerifyingKey::from_sec1_bytes(public_key)
                .map_err(|e| CurveError::InvalidPublicKey(format!("not a P-256 point: {}", e))),
            n => Err(CurveError::InvalidPublicKey(format!(
                "public key must be 33 or 65 bytes, got {}",
                n
            ))),
        }
    }

    fn compressed(key: &VerifyingKey) -> Result<[u8; 33], CurveError> {
        let point = key.to_encoded_point(true);
        point
            .as_bytes()
            .try_into()
            .map_err(|_| CurveError::InvalidPublicKey("unexpected point encoding".into()))
    }

    /// 65-byte `04 ∥ X ∥ Y` encoding
    pub fn public_key_uncompressed(private_key: &[u8]) -> Result<[u8; 65], CurveError> {
        let signing_key = Self::parse_private_key(private_key)?;
        let point = signing_key.verifying_key().to_encoded_point(false);
        point
            .as_bytes()
            .try_into()
            .map_err(|_| CurveError::InvalidPublicKey("unexpected point encoding".into()))
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

impl SignatureScheme for Secp256r1Curve {
    type PrivateKey = Zeroizing<[u8; 32]>;
    type PublicKey = [u8; 33];
    type Signature = [u8; 64];

    fn generate_keypair() -> Result<(Self::PrivateKey, Self::PublicKey), CurveError> {
        let secret_key = SecretKey::random(&mut OsRng);
        let sk_bytes: [u8; 32] = secret_key.to_bytes().into();
        let pk = Self::compressed(&VerifyingKey::from(secret_key.public_key()))?;
        Ok((Zeroizing::new(sk_bytes), pk))
    }

    fn public_key_from_private(private_key: &[u8]) -> Result<Self::PublicKey, CurveError> {
        let signing_key = Self::parse_private_key(private_key)?;
        Self::compressed(signing_key.verifying_key())
    }

    fn sign(private_key: &[u8], message: &[u8]) -> Result<Self::Signature, CurveError> {
        let signing_key = Self::parse_private_key(private_key)?;
        require("message", message)?;

        // SigningKey hashes with SHA-256
        let signature: Signature = signing_key.sign(message);
        Ok(signature.to_bytes().into())
    }

    fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool, CurveError> {
        let verifying_key = Self::parse_public_key(public_key)?;
        let components = EcdsaSignature::from_bytes(signature)?;

        // Zero scalars are a signature that cannot verify, not a decode error
        let sig = match Signature::from_slice(&components.to_bytes()) {
            Ok(sig) => sig,
            Err(_) => return Ok(false),
        };
        Ok(verifying_key.verify(message, &sig).is_ok())
    }
}

// MARK: - Tests
