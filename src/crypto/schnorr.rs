//! BIP-340 Schnorr Signatures
//!
//! Messages of any length (including empty) are reduced with SHA-256 and
//! the digest is signed with deterministic BIP-340 nonces. Public keys are
//! x-only (32 bytes); a 33-byte compressed point is accepted on input and
//! reduced to its x coordinate.
//!
//! Reference: https://github.com/bitcoin/bips/blob/master/bip-0340.mediawiki

use bitcoin::secp256k1::{
    schnorr::Signature as SchnorrSignature, All, Keypair, Message, PublicKey, Secp256k1, SecretKey,
    XOnlyPublicKey,
};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::curves::{require, CurveError, SignatureScheme};
use crate::utils::crypto::sha256;

// MARK: - Schnorr Key Types

/// X-only public key (32 bytes)
///
/// In BIP-340, public keys are represented as only their x-coordinate.
/// The y-coordinate is implicitly even.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XOnlyPubKey(pub [u8; 32]);

impl XOnlyPubKey {
    /// 32-byte x-only key or 33-byte compressed point
    pub fn from_slice(slice: &[u8]) -> Result<Self, CurveError> {
        require("public key", slice)?;
        let key = match slice.len() {
            32 => XOnlyPublicKey::from_slice(slice)
                .map_err(|e| CurveError::InvalidPublicKey(e.to_string()))?,
            33 => {
                PublicKey::from_slice(slice)
                    .map_err(|e| CurveError::InvalidPublicKey(e.to_string()))?
                    .x_only_public_key()
                    .0
            }
            n => {
                return Err(CurveError::InvalidPublicKey(format!(
                    "expected 32 or 33 bytes, got {}",
                    n
                )))
            }
        };
        Ok(Self::from(key))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn to_secp256k1(self) -> Result<XOnlyPublicKey, CurveError> {
        XOnlyPublicKey::from_slice(&self.0).map_err(|e| CurveError::InvalidPublicKey(e.to_string()))
    }
}

impl AsRef<[u8]> for XOnlyPubKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<XOnlyPublicKey> for XOnlyPubKey {
    fn from(key: XOnlyPublicKey) -> Self {
        Self(key.serialize())
    }
}

/// Schnorr signature (64 bytes: 32-byte R + 32-byte s)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchnorrSig(pub [u8; 64]);

impl SchnorrSig {
    pub fn from_slice(slice: &[u8]) -> Result<Self, CurveError> {
        require("signature", slice)?;
        let bytes: [u8; 64] = slice.try_into().map_err(|_| {
            CurveError::InvalidSignature(format!("expected 64 bytes, got {}", slice.len()))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// R component (first 32 bytes)
    pub fn r(&self) -> &[u8] {
        &self.0[..32]
    }

    /// s component (last 32 bytes)
    pub fn s(&self) -> &[u8] {
        &self.0[32..]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for SchnorrSig {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<SchnorrSignature> for SchnorrSig {
    fn from(sig: SchnorrSignature) -> Self {
        let bytes: &[u8; 64] = sig.as_ref();
        Self(*bytes)
    }
}

// MARK: - Schnorr Signer

/// BIP-340 Schnorr signer
pub struct SchnorrSigner {
    secp: Secp256k1<All>,
}

impl Default for SchnorrSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl SchnorrSigner {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::new(),
        }
    }

    fn keypair(&self, private_key: &[u8]) -> Result<Keypair, CurveError> {
        require("private key", private_key)?;
        if private_key.len() != 32 {
            return Err(CurveError::InvalidPrivateKey(format!(
                "private key must be 32 bytes, got {}",
                private_key.len()
            )));
        }
        let secret_key = SecretKey::from_slice(private_key)
            .map_err(|e| CurveError::InvalidPrivateKey(e.to_string()))?;
        Ok(Keypair::from_secret_key(&self.secp, &secret_key))
    }

    /// Derive x-only public key from private key
    pub fn public_key(&self, private_key: &[u8]) -> Result<XOnlyPubKey, CurveError> {
        let (x_only, _parity) = self.keypair(private_key)?.x_only_public_key();
        Ok(XOnlyPubKey::from(x_only))
    }

    /// Sign `SHA256(message)` with a deterministic nonce.
    pub fn sign(&self, private_key: &[u8], message: &[u8]) -> Result<SchnorrSig, CurveError> {
        let keypair = self.keypair(private_key)?;
        let msg = Message::from_digest(sha256(message));
        Ok(SchnorrSig::from(self.secp.sign_schnorr_no_aux_rand(&msg, &keypair)))
    }

    /// Sign a 32-byte digest directly with auxiliary randomness.
    pub fn sign_digest_with_aux_rand(
        &self,
        private_key: &[u8],
        digest: &[u8; 32],
        aux_rand: &[u8; 32],
    ) -> Result<SchnorrSig, CurveError> {
        let keypair = self.keypair(private_key)?;
        let msg = Message::from_digest(*digest);
        Ok(SchnorrSig::from(
            self.secp.sign_schnorr_with_aux_rand(&msg, &keypair, aux_rand),
        ))
    }

    pub fn verify(
        &self,
        public_key: &XOnlyPubKey,
        message: &[u8],
        signature: &SchnorrSig,
    ) -> Result<bool, CurveError> {
        self.verify_digest(public_key, &sha256(message), signature)
    }

    pub fn verify_digest(
        &self,
        public_key: &XOnlyPubKey,
        digest: &[u8; 32],
        signature: &SchnorrSig,
    ) -> Result<bool, CurveError> {
        let secp_pubkey = public_key.to_secp256k1()?;
        // An R that is not a field element cannot verify; treat as mismatch
        let secp_sig = match SchnorrSignature::from_slice(signature.as_bytes()) {
            Ok(sig) => sig,
            Err(_) => return Ok(false),
        };
        let msg = Message::from_digest(*digest);
        Ok(self.secp.verify_schnorr(&secp_sig, &msg, &secp_pubkey).is_ok())
    }
}

/// [`SignatureScheme`] adapter over [`SchnorrSigner`]
pub struct Schnorr;

impl SignatureScheme for Schnorr {
    type PrivateKey = Zeroizing<[u8; 32]>;
    type PublicKey = XOnlyPubKey;
    type Signature = SchnorrSig;

    fn generate_keypair() -> Result<(Self::PrivateKey, Self::PublicKey), CurveError> {
        use super::curves::Secp256k1Curve;

        let (sk, _) = Secp256k1Curve::generate_keypair()?;
        let pk = SchnorrSigner::new().public_key(sk.as_ref())?;
        Ok((sk, pk))
    }

    fn public_key_from_private(private_key: &[u8]) -> Result<Self::PublicKey, CurveError> {
        SchnorrSigner::new().public_key(private_key)
    }

    fn sign(private_key: &[u8], message: &[u8]) -> Result<Self::Signature, CurveError> {
        SchnorrSigner::new().sign(private_key, message)
    }

    fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool, CurveError> {
        let pk = XOnlyPubKey::from_slice(public_key)?;
        let sig = SchnorrSig::from_slice(signature)?;
        SchnorrSigner::new().verify(&pk, message, &sig)
    }
}

// MARK: - Tests
