//! Common interface of the signature schemes.

use super::CurveError;

/// Generate / derive-public / sign / verify over raw byte encodings
pub trait SignatureScheme {
    /// Private key encoding
    type PrivateKey: AsRef<[u8]>;
    /// Public key encoding (compressed where the curve allows it)
    type PublicKey: AsRef<[u8]>;
    type Signature: AsRef<[u8]>;

    /// Fresh keypair from the OS random source
    fn generate_keypair() -> Result<(Self::PrivateKey, Self::PublicKey), CurveError>;

    fn public_key_from_private(private_key: &[u8]) -> Result<Self::PublicKey, CurveError>;

    fn sign(private_key: &[u8], message: &[u8]) -> Result<Self::Signature, CurveError>;

    /// `Ok(false)` for a well-formed signature that does not match.
    fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool, CurveError>;
}

/// Signatures from which the signer's public key can be recovered
pub trait RecoverableSignature: SignatureScheme {
    /// Sign a prehashed 32-byte digest, returning `r ∥ s` and the recovery id.
    fn sign_recoverable(private_key: &[u8], digest: &[u8; 32]) -> Result<([u8; 64], u8), CurveError>;

    fn recover_public_key(
        digest: &[u8; 32],
        signature: &[u8],
        recovery_id: u8,
    ) -> Result<Self::PublicKey, CurveError>;
}
