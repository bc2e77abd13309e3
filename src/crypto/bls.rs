//! BLS12-381 signatures
//!
//! Minimal-pubkey-size variant: 48-byte G1 public keys and 96-byte G2
//! signatures. Messages are reduced with SHA-256 before hashing to G2 under
//! the proof-of-possession ciphersuite tag.
//!
//! The curve context is set up once per process on first use. Set-up runs a
//! sign/verify pairing self-check; repeated calls return the same context.

use std::sync::OnceLock;

use blst::min_pk::{AggregateSignature, PublicKey, SecretKey, Signature};
use blst::BLST_ERROR;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::{ErrorCode, KeysmithError};
use crate::log_debug;
use crate::utils::crypto::sha256;

/// Hash-to-curve domain separation tag
pub const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

pub const SECRET_KEY_LEN: usize = 32;
pub const PUBLIC_KEY_LEN: usize = 48;
pub const SIGNATURE_LEN: usize = 96;

// MARK: - Errors

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlsError {
    #[error("invalid BLS secret key: {0}")]
    InvalidSecretKey(String),
    #[error("invalid BLS public key: {0}")]
    InvalidPublicKey(String),
    #[error("invalid BLS signature: {0}")]
    InvalidSignature(String),
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("entropy source failed: {0}")]
    Entropy(String),
    #[error("curve initialization failed: {0:?}")]
    Initialization(BLST_ERROR),
    #[error("aggregation failed: {0}")]
    Aggregation(String),
}

impl From<BlsError> for KeysmithError {
    fn from(e: BlsError) -> Self {
        let code = match e {
            BlsError::InvalidSecretKey(_) => ErrorCode::InvalidPrivateKey,
            BlsError::InvalidPublicKey(_) => ErrorCode::CurvePoint,
            BlsError::InvalidSignature(_) | BlsError::Aggregation(_) => ErrorCode::InvalidSignature,
            BlsError::Missing(_) => ErrorCode::Validation,
            BlsError::Entropy(_) => ErrorCode::Entropy,
            BlsError::Initialization(_) => ErrorCode::Internal,
        };
        KeysmithError::new(code, e.to_string())
    }
}

pub type BlsResult<T> = Result<T, BlsError>;

// MARK: - Context

/// Process-wide curve context
#[derive(Debug)]
pub struct BlsContext {
    dst: &'static [u8],
}

impl BlsContext {
    pub fn dst(&self) -> &'static [u8] {
        self.dst
    }
}

static CONTEXT: OnceLock<BlsResult<BlsContext>> = OnceLock::new();

#[cfg(test)]
static INIT_RUNS: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

/// Idempotent, thread-safe set-up; every BLS operation calls this first.
pub fn init() -> BlsResult<&'static BlsContext> {
    CONTEXT
        .get_or_init(|| {
            #[cfg(test)]
            INIT_RUNS.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

            log_debug!("bls", "initializing BLS12-381 context");
            self_check()?;
            Ok(BlsContext { dst: DST })
        })
        .as_ref()
        .map_err(Clone::clone)
}

fn self_check() -> BlsResult<()> {
    let sk = SecretKey::key_gen(&[0x42; 32], &[]).map_err(BlsError::Initialization)?;
    let msg = sha256(b"bls12-381 self check");
    let sig = sk.sign(&msg, DST, &[]);
    match sig.verify(true, &msg, DST, &[], &sk.sk_to_pk(), true) {
        BLST_ERROR::BLST_SUCCESS => Ok(()),
        err => Err(BlsError::Initialization(err)),
    }
}

// MARK: - Keys

pub struct BlsSecretKey(SecretKey);

impl BlsSecretKey {
    /// Fresh key from 32 bytes of OS randomness
    pub fn generate() -> BlsResult<Self> {
        init()?;
        let mut ikm = Zeroizing::new([0u8; 32]);
        OsRng
            .try_fill_bytes(ikm.as_mut())
            .map_err(|e| BlsError::Entropy(e.to_string()))?;
        Self::from_ikm(ikm.as_ref())
    }

    /// Deterministic key generation from at least 32 bytes of keying material
    pub fn from_ikm(ikm: &[u8]) -> BlsResult<Self> {
        SecretKey::key_gen(ikm, &[])
            .map(Self)
            .map_err(|e| BlsError::InvalidSecretKey(format!("{:?}", e)))
    }

    pub fn from_bytes(bytes: &[u8]) -> BlsResult<Self> {
        if bytes.is_empty() {
            return Err(BlsError::Missing("private key"));
        }
        if bytes.len() != SECRET_KEY_LEN {
            return Err(BlsError::InvalidSecretKey(format!(
                "expected {} bytes, got {}",
                SECRET_KEY_LEN,
                bytes.len()
            )));
        }
        SecretKey::from_bytes(bytes)
            .map(Self)
            .map_err(|e| BlsError::InvalidSecretKey(format!("{:?}", e)))
    }

    pub fn to_bytes(&self) -> Zeroizing<[u8; SECRET_KEY_LEN]> {
        Zeroizing::new(self.0.to_bytes())
    }

    pub fn public_key(&self) -> BlsPublicKey {
        BlsPublicKey(self.0.sk_to_pk())
    }

    /// Sign `SHA256(message)`; empty messages are allowed.
    pub fn sign(&self, message: &[u8]) -> BlsResult<BlsSignature> {
        let ctx = init()?;
        Ok(BlsSignature(self.0.sign(&sha256(message), ctx.dst(), &[])))
    }
}

impl std::fmt::Debug for BlsSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BlsSecretKey([REDACTED])")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlsPublicKey(PublicKey);

impl BlsPublicKey {
    pub fn from_bytes(bytes: &[u8]) -> BlsResult<Self> {
        if bytes.is_empty() {
            return Err(BlsError::Missing("public key"));
        }
        if bytes.len() != PUBLIC_KEY_LEN {
            return Err(BlsError::InvalidPublicKey(format!(
                "expected {} bytes, got {}",
                PUBLIC_KEY_LEN,
                bytes.len()
            )));
        }
        PublicKey::key_validate(bytes)
            .map(Self)
            .map_err(|e| BlsError::InvalidPublicKey(format!("{:?}", e)))
    }

    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.0.compress()
    }

    /// `Ok(false)` when the signature does not match or is not a valid
    /// group element; length errors are reported as errors.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> BlsResult<bool> {
        let ctx = init()?;
        let sig = match BlsSignature::decode(signature)? {
            Some(sig) => sig,
            None => return Ok(false),
        };
        match sig.0.verify(true, &sha256(message), ctx.dst(), &[], &self.0, true) {
            BLST_ERROR::BLST_SUCCESS => Ok(true),
            BLST_ERROR::BLST_VERIFY_FAIL | BLST_ERROR::BLST_POINT_NOT_IN_GROUP => Ok(false),
            err => Err(BlsError::InvalidSignature(format!("{:?}", err))),
        }
    }
}

// MARK: - Signatures

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlsSignature(Signature);

impl BlsSignature {
    pub fn from_bytes(bytes: &[u8]) -> BlsResult<Self> {
        Self::decode(bytes)?
            .ok_or_else(|| BlsError::InvalidSignature("not a point on G2".into()))
    }

    /// Length-checked decode; `None` for 96 bytes that are not a curve point.
    fn decode(bytes: &[u8]) -> BlsResult<Option<Self>> {
        if bytes.is_empty() {
            return Err(BlsError::Missing("signature"));
        }
        if bytes.len() != SIGNATURE_LEN {
            return Err(BlsError::InvalidSignature(format!(
                "expected {} bytes, got {}",
                SIGNATURE_LEN,
                bytes.len()
            )));
        }
        Ok(Signature::from_bytes(bytes).ok().map(Self))
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        self.0.compress()
    }
}

/// Sum of signatures over the same message
pub struct BlsAggregateSignature(AggregateSignature);

impl BlsAggregateSignature {
    pub fn aggregate(signatures: &[BlsSignature]) -> BlsResult<Self> {
        if signatures.is_empty() {
            return Err(BlsError::Missing("signatures"));
        }
        let refs: Vec<&Signature> = signatures.iter().map(|s| &s.0).collect();
        AggregateSignature::aggregate(&refs, true)
            .map(Self)
            .map_err(|e| BlsError::Aggregation(format!("{:?}", e)))
    }

    pub fn to_signature(&self) -> BlsSignature {
        BlsSignature(self.0.to_signature())
    }

    /// All `public_keys` signed the same `message`.
    pub fn verify(&self, message: &[u8], public_keys: &[BlsPublicKey]) -> BlsResult<bool> {
        let ctx = init()?;
        if public_keys.is_empty() {
            return Err(BlsError::Missing("public keys"));
        }
        let pks: Vec<&PublicKey> = public_keys.iter().map(|p| &p.0).collect();
        let sig = self.0.to_signature();
        match sig.fast_aggregate_verify(true, &sha256(message), ctx.dst(), &pks) {
            BLST_ERROR::BLST_SUCCESS => Ok(true),
            BLST_ERROR::BLST_VERIFY_FAIL => Ok(false),
            err => Err(BlsError::Aggregation(format!("{:?}", err))),
        }
    }
}

/// Secret and public key together
pub struct BlsKeyPair {
    pub secret_key: BlsSecretKey,
    pub public_key: BlsPublicKey,
}

impl BlsKeyPair {
    pub fn generate() -> BlsResult<Self> {
        let secret_key = BlsSecretKey::generate()?;
        let public_key = secret_key.public_key();
        Ok(Self {
            secret_key,
            public_key,
        })
    }
}

// MARK: - Byte-level operations

pub fn generate_keypair() -> BlsResult<(Zeroizing<[u8; SECRET_KEY_LEN]>, [u8; PUBLIC_KEY_LEN])> {
    let pair = BlsKeyPair::generate()?;
    Ok((pair.secret_key.to_bytes(), pair.public_key.to_bytes()))
}

pub fn public_key_from_private(private_key: &[u8]) -> BlsResult<[u8; PUBLIC_KEY_LEN]> {
    init()?;
    Ok(BlsSecretKey::from_bytes(private_key)?.public_key().to_bytes())
}

pub fn sign(private_key: &[u8], message: &[u8]) -> BlsResult<[u8; SIGNATURE_LEN]> {
    Ok(BlsSecretKey::from_bytes(private_key)?.sign(message)?.to_bytes())
}

pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> BlsResult<bool> {
    init()?;
    BlsPublicKey::from_bytes(public_key)?.verify(message, signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    fn fixed_key(tag: u8) -> BlsSecretKey {
        BlsSecretKey::from_ikm(&[tag; 32]).unwrap()
    }

    #[test]
    fn test_init_is_idempotent_across_threads() {
        let handles: Vec<_> = (0..8).map(|_| std::thread::spawn(init)).collect();
        for h in handles {
            assert!(h.join().unwrap().is_ok());
        }
        init().unwrap();
        assert_eq!(INIT_RUNS.load(Ordering::SeqCst), 1);
        assert_eq!(init().unwrap().dst(), DST);
    }

    #[test]
    fn test_sign_verify() {
        let sk = fixed_key(1);
        let pk = sk.public_key();
        let sig = sk.sign(b"hello bls").unwrap();
        assert!(pk.verify(b"hello bls", &sig.to_bytes()).unwrap());
        assert!(!pk.verify(b"hello BLS", &sig.to_bytes()).unwrap());

        let other = fixed_key(2).public_key();
        assert!(!other.verify(b"hello bls", &sig.to_bytes()).unwrap());
    }

    #[test]
    fn test_flipped_signature_bit_is_false() {
        let sk = fixed_key(3);
        let mut sig = sk.sign(b"m").unwrap().to_bytes();
        sig[50] ^= 0x01;
        assert!(!sk.public_key().verify(b"m", &sig).unwrap());
    }

    #[test]
    fn test_empty_message() {
        let (sk, pk) = generate_keypair().unwrap();
        let sig = sign(sk.as_ref(), b"").unwrap();
        assert!(verify(&pk, b"", &sig).unwrap());
    }

    #[test]
    fn test_serialization_sizes() {
        let sk = fixed_key(4);
        assert_eq!(
            public_key_from_private(sk.to_bytes().as_ref()).unwrap(),
            sk.public_key().to_bytes()
        );
        let sig = sk.sign(b"x").unwrap();
        assert_eq!(BlsSignature::from_bytes(&sig.to_bytes()).unwrap(), sig);
        assert_eq!(
            BlsPublicKey::from_bytes(&sk.public_key().to_bytes()).unwrap(),
            sk.public_key()
        );
    }

    #[test]
    fn test_malformed_inputs() {
        let sk = fixed_key(5);
        let sig = sk.sign(b"m").unwrap().to_bytes();
        let pk = sk.public_key().to_bytes();
        assert!(matches!(verify(&pk[..47], b"m", &sig), Err(BlsError::InvalidPublicKey(_))));
        assert!(matches!(verify(&[0u8; 48], b"m", &sig), Err(BlsError::InvalidPublicKey(_))));
        assert!(matches!(verify(&pk, b"m", &sig[..95]), Err(BlsError::InvalidSignature(_))));
        assert!(matches!(verify(&pk, b"m", &[]), Err(BlsError::Missing(_))));
        assert!(matches!(sign(&[], b"m"), Err(BlsError::Missing(_))));
        assert!(matches!(sign(&[0u8; 32], b"m"), Err(BlsError::InvalidSecretKey(_))));
    }

    #[test]
    fn test_aggregate() {
        let keys: Vec<BlsSecretKey> = (10..13).map(fixed_key).collect();
        let sigs: Vec<BlsSignature> = keys.iter().map(|k| k.sign(b"block").unwrap()).collect();
        let pks: Vec<BlsPublicKey> = keys.iter().map(|k| k.public_key()).collect();

        let agg = BlsAggregateSignature::aggregate(&sigs).unwrap();
        assert!(agg.verify(b"block", &pks).unwrap());
        assert!(!agg.verify(b"other block", &pks).unwrap());
        assert!(!agg.verify(b"block", &pks[..2]).unwrap());
        assert_eq!(agg.to_signature().to_bytes().len(), SIGNATURE_LEN);
    }

    #[test]
    fn test_error_codes() {
        let err: KeysmithError = BlsError::InvalidPublicKey("x".into()).into();
        assert_eq!(err.code, ErrorCode::CurvePoint);
        let err: KeysmithError = BlsError::Missing("message").into();
        assert_eq!(err.code, ErrorCode::Validation);
    }
}
