//! Signature engine
//!
//! Generate / derive-public / sign / verify for each [`Algorithm`]:
//! - ECDSA over P-256 and secp256k1 (`SHA256(message)`, 64-byte `r ∥ s`)
//! - BIP-340 Schnorr over secp256k1
//! - BLS12-381 (min-pk)
//!
//! Plus Keccak-based recoverable signing for Ethereum keys.
//!
//! Every operation is a pure function of its inputs. A signature that does
//! not match yields `Ok(false)`; malformed encodings are errors.

pub mod bls;
pub mod curves;
pub mod ethereum;
pub mod schnorr;

pub use bls::{BlsAggregateSignature, BlsError, BlsKeyPair, BlsPublicKey, BlsSecretKey, BlsSignature};
pub use curves::{
    CurveError, EcdsaSignature, RecoverableSignature, Secp256k1Curve, Secp256r1Curve, SignatureScheme,
};
pub use schnorr::{Schnorr, SchnorrSig, SchnorrSigner, XOnlyPubKey};

use zeroize::Zeroizing;

use crate::config::Algorithm;
use crate::error::KeysmithResult;

/// Byte encodings of a freshly generated key pair
pub struct GeneratedKey {
    pub private_key: Zeroizing<Vec<u8>>,
    pub public_key: Vec<u8>,
}

impl std::fmt::Debug for GeneratedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedKey")
            .field("private_key", &"[REDACTED]")
            .field("public_key", &hex::encode(&self.public_key))
            .finish()
    }
}

fn generated<S: SignatureScheme>() -> KeysmithResult<GeneratedKey> {
    let (sk, pk) = S::generate_keypair()?;
    Ok(GeneratedKey {
        private_key: Zeroizing::new(sk.as_ref().to_vec()),
        public_key: pk.as_ref().to_vec(),
    })
}

// MARK: - Unified operations

pub fn generate(algorithm: Algorithm) -> KeysmithResult<GeneratedKey> {
    match algorithm {
        Algorithm::Ecdsa => generated::<Secp256r1Curve>(),
        Algorithm::Secp256k1 => generated::<Secp256k1Curve>(),
        Algorithm::Schnorr => generated::<Schnorr>(),
        Algorithm::Bls => {
            let (sk, pk) = bls::generate_keypair()?;
            Ok(GeneratedKey {
                private_key: Zeroizing::new(sk.to_vec()),
                public_key: pk.to_vec(),
            })
        }
    }
}

/// Public key bytes: compressed SEC1 for ECDSA, x-only for Schnorr, G1 for BLS.
pub fn public_key_from_private(algorithm: Algorithm, private_key: &[u8]) -> KeysmithResult<Vec<u8>> {
    Ok(match algorithm {
        Algorithm::Ecdsa => Secp256r1Curve::public_key_from_private(private_key)?.to_vec(),
        Algorithm::Secp256k1 => Secp256k1Curve::public_key_from_private(private_key)?.to_vec(),
        Algorithm::Schnorr => Schnorr::public_key_from_private(private_key)?.as_ref().to_vec(),
        Algorithm::Bls => bls::public_key_from_private(private_key)?.to_vec(),
    })
}

pub fn sign(algorithm: Algorithm, private_key: &[u8], message: &[u8]) -> KeysmithResult<Vec<u8>> {
    Ok(match algorithm {
        Algorithm::Ecdsa => Secp256r1Curve::sign(private_key, message)?.to_vec(),
        Algorithm::Secp256k1 => Secp256k1Curve::sign(private_key, message)?.to_vec(),
        Algorithm::Schnorr => Schnorr::sign(private_key, message)?.as_ref().to_vec(),
        Algorithm::Bls => bls::sign(private_key, message)?.to_vec(),
    })
}

pub fn verify(
    algorithm: Algorithm,
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> KeysmithResult<bool> {
    Ok(match algorithm {
        Algorithm::Ecdsa => Secp256r1Curve::verify(public_key, message, signature)?,
        Algorithm::Secp256k1 => Secp256k1Curve::verify(public_key, message, signature)?,
        Algorithm::Schnorr => Schnorr::verify(public_key, message, signature)?,
        Algorithm::Bls => bls::verify(public_key, message, signature)?,
    })
}

/// ECDSA verification from separate `r` and `s` scalars.
pub fn verify_components(
    algorithm: Algorithm,
    public_key: &[u8],
    message: &[u8],
    r: &[u8],
    s: &[u8],
) -> KeysmithResult<bool> {
    match algorithm {
        Algorithm::Ecdsa => Ok(Secp256r1Curve::verify_components(public_key, message, r, s)?),
        Algorithm::Secp256k1 => Ok(Secp256k1Curve::verify_components(public_key, message, r, s)?),
        other => Err(crate::error::KeysmithError::unsupported_algorithm(&format!(
            "{} (r/s components are ECDSA only)",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    const ALL: [Algorithm; 4] = [
        Algorithm::Ecdsa,
        Algorithm::Secp256k1,
        Algorithm::Schnorr,
        Algorithm::Bls,
    ];

    #[test]
    fn test_round_trip_every_algorithm() {
        for alg in ALL {
            let key = generate(alg).unwrap();
            assert_eq!(public_key_from_private(alg, &key.private_key).unwrap(), key.public_key);

            let sig = sign(alg, &key.private_key, b"integrity").unwrap();
            assert!(verify(alg, &key.public_key, b"integrity", &sig).unwrap(), "{}", alg);
            assert!(!verify(alg, &key.public_key, b"integrity!", &sig).unwrap(), "{}", alg);
        }
    }

    #[test]
    fn test_key_sizes() {
        let sizes = [(Algorithm::Ecdsa, 33, 64), (Algorithm::Secp256k1, 33, 64), (Algorithm::Schnorr, 32, 64), (Algorithm::Bls, 48, 96)];
        for (alg, pk_len, sig_len) in sizes {
            let key = generate(alg).unwrap();
            assert_eq!(key.private_key.len(), 32);
            assert_eq!(key.public_key.len(), pk_len);
            assert_eq!(sign(alg, &key.private_key, b"x").unwrap().len(), sig_len);
        }
    }

    #[test]
    fn test_empty_message_policy() {
        for alg in [Algorithm::Ecdsa, Algorithm::Secp256k1] {
            let key = generate(alg).unwrap();
            let err = sign(alg, &key.private_key, b"").unwrap_err();
            assert_eq!(err.code, ErrorCode::Validation);

            let sig = sign(alg, &key.private_key, b"other").unwrap();
            assert!(!verify(alg, &key.public_key, b"", &sig).unwrap());
        }
        for alg in [Algorithm::Schnorr, Algorithm::Bls] {
            let key = generate(alg).unwrap();
            let sig = sign(alg, &key.private_key, b"").unwrap();
            assert!(verify(alg, &key.public_key, b"", &sig).unwrap());
        }
    }

    #[test]
    fn test_components_dispatch() {
        let key = generate(Algorithm::Secp256k1).unwrap();
        let sig = sign(Algorithm::Secp256k1, &key.private_key, b"rs").unwrap();
        assert!(verify_components(Algorithm::Secp256k1, &key.public_key, b"rs", &sig[..32], &sig[32..]).unwrap());

        let err = verify_components(Algorithm::Bls, &key.public_key, b"rs", &sig[..32], &sig[32..]).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedAlgorithm);
    }

    #[test]
    fn test_missing_key_is_validation_error() {
        for alg in ALL {
            let err = sign(alg, &[], b"m").unwrap_err();
            assert_eq!(err.code, ErrorCode::Validation, "{}", alg);
        }
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let key = generate(Algorithm::Secp256k1).unwrap();
        let rendered = format!("{:?}", key);
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains(&hex::encode(&*key.private_key)));
    }
}
