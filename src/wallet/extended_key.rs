//! BIP-32 extended keys
//!
//! An `ExtendedKey` is either private (scalar + chain code) or public
//! (point + chain code). Private keys can always be neutered into their
//! public counterpart; the reverse is impossible.
//!
//! Child derivation:
//! - hardened: `HMAC-SHA512(chain_code, 0x00 ∥ k_par ∥ ser32(i | 2^31))`, private parents only
//! - normal:   `HMAC-SHA512(chain_code, ser_P(K_par) ∥ ser32(i))`, private or public parents
//!
//! If the left half of the digest is not a valid scalar, or the resulting key
//! is zero / the point at infinity, derivation moves on to the next index.

use bitcoin::secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

use super::derivation_path::{ChildNumber, DerivationPath, HARDENED};
use super::mnemonic::Seed;
use crate::config::Network;
use crate::encoding::base58;
use crate::error::{ErrorCode, KeysmithError, KeysmithResult};
use crate::utils::crypto::{hash160, hmac_sha512};
use crate::{log_debug, log_warn};

const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

/// Serialized length: version(4) depth(1) fingerprint(4) child(4) chain code(32) key(33)
pub const EXTENDED_KEY_LEN: usize = 78;

const MIN_SEED_LEN: usize = 16;
const MAX_SEED_LEN: usize = 64;

pub type ChainCode = [u8; 32];
pub type Fingerprint = [u8; 4];

/// Flat private/public key pair projected out of an extended key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        Self {
            public_key: PublicKey::from_secret_key(&secp, &secret_key),
            secret_key,
        }
    }

    pub fn private_key_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.secret_key.secret_bytes()))
    }

    pub fn public_key_hex(&self, compressed: bool) -> String {
        if compressed {
            hex::encode(self.public_key.serialize())
        } else {
            hex::encode(self.public_key.serialize_uncompressed())
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum KeyMaterial {
    Private(SecretKey),
    Public,
}

#[derive(Clone, PartialEq, Eq)]
pub struct ExtendedKey {
    material: KeyMaterial,
    public_key: PublicKey,
    chain_code: ChainCode,
    depth: u8,
    parent_fingerprint: Fingerprint,
    child_number: ChildNumber,
    network: Network,
}

impl ExtendedKey {
    /// Master key from raw seed bytes (16 to 64 bytes).
    pub fn new_master(seed: &[u8], network: Network) -> KeysmithResult<Self> {
        if !(MIN_SEED_LEN..=MAX_SEED_LEN).contains(&seed.len()) {
            return Err(KeysmithError::invalid_seed(format!(
                "seed must be {}-{} bytes, got {}",
                MIN_SEED_LEN,
                MAX_SEED_LEN,
                seed.len()
            )));
        }

        let (il, ir) = hmac_sha512(MASTER_HMAC_KEY, seed)?;
        let il = Zeroizing::new(il);
        let secret_key = SecretKey::from_slice(il.as_ref()).map_err(|_| {
            KeysmithError::invalid_seed("master key is zero or exceeds the curve order")
        })?;

        log_debug!("extended_key", "created master key", network = network);
        Ok(Self::private(secret_key, ir, 0, [0; 4], ChildNumber::from_raw(0), network))
    }

    pub fn from_seed(seed: &Seed, network: Network) -> KeysmithResult<Self> {
        Self::new_master(seed.as_bytes(), network)
    }

    fn private(
        secret_key: SecretKey,
        chain_code: ChainCode,
        depth: u8,
        parent_fingerprint: Fingerprint,
        child_number: ChildNumber,
        network: Network,
    ) -> Self {
        let secp = Secp256k1::new();
        Self {
            material: KeyMaterial::Private(secret_key),
            public_key: PublicKey::from_secret_key(&secp, &secret_key),
            chain_code,
            depth,
            parent_fingerprint,
            child_number,
            network,
        }
    }

    pub fn is_private(&self) -> bool {
        matches!(self.material, KeyMaterial::Private(_))
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn chain_code(&self) -> &ChainCode {
        &self.chain_code
    }

    pub fn parent_fingerprint(&self) -> Fingerprint {
        self.parent_fingerprint
    }

    pub fn child_number(&self) -> ChildNumber {
        self.child_number
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    pub fn private_key(&self) -> KeysmithResult<SecretKey> {
        match self.material {
            KeyMaterial::Private(sk) => Ok(sk),
            KeyMaterial::Public => Err(KeysmithError::validation(
                "extended key is public-only; no private key available",
            )),
        }
    }

    pub fn to_key_pair(&self) -> KeysmithResult<KeyPair> {
        Ok(KeyPair {
            secret_key: self.private_key()?,
            public_key: self.public_key,
        })
    }

    /// hash160 of the compressed public key
    pub fn identifier(&self) -> [u8; 20] {
        hash160(&self.public_key.serialize())
    }

    pub fn fingerprint(&self) -> Fingerprint {
        let id = self.identifier();
        [id[0], id[1], id[2], id[3]]
    }

    /// Public counterpart with identical chain code and position in the tree
    pub fn neuter(&self) -> Self {
        Self {
            material: KeyMaterial::Public,
            ..self.clone()
        }
    }

    pub fn derive(&self, index: u32, hardened: bool) -> KeysmithResult<Self> {
        self.derive_child(ChildNumber::new(index, hardened)?)
    }

    pub fn derive_child(&self, child: ChildNumber) -> KeysmithResult<Self> {
        if self.depth == u8::MAX {
            return Err(KeysmithError::new(
                ErrorCode::MaxDepthExceeded,
                "extended key is already at depth 255",
            ));
        }
        if child.is_hardened() && !self.is_private() {
            return Err(KeysmithError::new(
                ErrorCode::HardenedFromPublic,
                format!("cannot derive hardened child {} from a public key", child),
            ));
        }

        let secp = Secp256k1::new();
        let (child, (material, public_key, chain_code)) = next_valid_child(child, |candidate| {
            let (il, ir) = self.child_digest(candidate)?;
            let tweak = match Scalar::from_be_bytes(il) {
                Ok(tweak) => tweak,
                Err(_) => return Ok(None),
            };
            let derived = match self.material {
                KeyMaterial::Private(sk) => sk.add_tweak(&tweak).ok().map(|child_sk| {
                    (
                        KeyMaterial::Private(child_sk),
                        PublicKey::from_secret_key(&secp, &child_sk),
                    )
                }),
                KeyMaterial::Public => self
                    .public_key
                    .add_exp_tweak(&secp, &tweak)
                    .ok()
                    .map(|child_pk| (KeyMaterial::Public, child_pk)),
            };
            Ok(derived.map(|(material, public_key)| (material, public_key, ir)))
        })?;

        Ok(Self {
            material,
            public_key,
            chain_code,
            depth: self.depth + 1,
            parent_fingerprint: self.fingerprint(),
            child_number: child,
            network: self.network,
        })
    }

    fn child_digest(&self, child: ChildNumber) -> KeysmithResult<([u8; 32], [u8; 32])> {
        let mut data = Zeroizing::new(Vec::with_capacity(37));
        match (child.is_hardened(), &self.material) {
            (true, KeyMaterial::Private(sk)) => {
                data.push(0x00);
                data.extend_from_slice(&sk.secret_bytes());
            }
            (true, KeyMaterial::Public) => {
                return Err(KeysmithError::new(
                    ErrorCode::HardenedFromPublic,
                    "hardened derivation requires a private key",
                ))
            }
            (false, _) => data.extend_from_slice(&self.public_key.serialize()),
        }
        data.extend_from_slice(&child.to_raw().to_be_bytes());
        hmac_sha512(&self.chain_code, &data)
    }

    pub fn derive_path(&self, path: &DerivationPath) -> KeysmithResult<Self> {
        let mut current = self.clone();
        for child in path.components() {
            current = current.derive_child(*child)?;
        }
        Ok(current)
    }

    // MARK: - Serialization

    pub fn to_bytes(&self) -> Zeroizing<[u8; EXTENDED_KEY_LEN]> {
        let mut out = Zeroizing::new([0u8; EXTENDED_KEY_LEN]);
        let version = match self.material {
            KeyMaterial::Private(_) => self.network.xprv_version(),
            KeyMaterial::Public => self.network.xpub_version(),
        };
        out[0..4].copy_from_slice(&version);
        out[4] = self.depth;
        out[5..9].copy_from_slice(&self.parent_fingerprint);
        out[9..13].copy_from_slice(&self.child_number.to_raw().to_be_bytes());
        out[13..45].copy_from_slice(&self.chain_code);
        match self.material {
            KeyMaterial::Private(sk) => {
                out[45] = 0x00;
                out[46..78].copy_from_slice(&sk.secret_bytes());
            }
            KeyMaterial::Public => out[45..78].copy_from_slice(&self.public_key.serialize()),
        }
        out
    }

    pub fn from_bytes(data: &[u8]) -> KeysmithResult<Self> {
        if data.len() != EXTENDED_KEY_LEN {
            return Err(KeysmithError::unrecognized_format(format!(
                "extended key must be {} bytes, got {}",
                EXTENDED_KEY_LEN,
                data.len()
            )));
        }

        let version = [data[0], data[1], data[2], data[3]];
        let (network, private) = [Network::Mainnet, Network::Testnet]
            .into_iter()
            .find_map(|net| {
                if version == net.xprv_version() {
                    Some((net, true))
                } else if version == net.xpub_version() {
                    Some((net, false))
                } else {
                    None
                }
            })
            .ok_or_else(|| {
                KeysmithError::unrecognized_format(format!(
                    "unknown extended key version {}",
                    hex::encode(version)
                ))
            })?;

        let depth = data[4];
        let parent_fingerprint = [data[5], data[6], data[7], data[8]];
        let child_number =
            ChildNumber::from_raw(u32::from_be_bytes([data[9], data[10], data[11], data[12]]));
        if depth == 0 && (parent_fingerprint != [0; 4] || child_number.to_raw() != 0) {
            return Err(KeysmithError::unrecognized_format(
                "master key with non-zero parent fingerprint or child index",
            ));
        }

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&data[13..45]);

        if private {
            if data[45] != 0x00 {
                return Err(KeysmithError::unrecognized_format(
                    "private extended key must pad its key with 0x00",
                ));
            }
            let secret_key = SecretKey::from_slice(&data[46..78]).map_err(|_| {
                KeysmithError::invalid_private_key("extended key scalar out of range")
            })?;
            Ok(Self::private(
                secret_key,
                chain_code,
                depth,
                parent_fingerprint,
                child_number,
                network,
            ))
        } else {
            let public_key = PublicKey::from_slice(&data[45..78]).map_err(|_| {
                KeysmithError::curve_point("extended key point is not on secp256k1")
            })?;
            Ok(Self {
                material: KeyMaterial::Public,
                public_key,
                chain_code,
                depth,
                parent_fingerprint,
                child_number,
                network,
            })
        }
    }

    /// Base58Check text (`xprv`/`xpub`/`tprv`/`tpub`)
    pub fn to_base58(&self) -> String {
        base58::encode_check(self.to_bytes().as_ref())
    }

    pub fn from_base58(input: &str) -> KeysmithResult<Self> {
        let data = Zeroizing::new(base58::decode_check(input)?);
        Self::from_bytes(&data)
    }
}

/// Try `start`, then each following index, until `attempt` yields a key.
fn next_valid_child<T>(
    start: ChildNumber,
    mut attempt: impl FnMut(ChildNumber) -> KeysmithResult<Option<T>>,
) -> KeysmithResult<(ChildNumber, T)> {
    let mut child = start;
    loop {
        if let Some(derived) = attempt(child)? {
            return Ok((child, derived));
        }
        log_warn!("extended_key", "invalid child key, skipping index", index = child);
        let next = child.index() + 1;
        if next >= HARDENED {
            return Err(KeysmithError::new(
                ErrorCode::InvalidChildIndex,
                "no valid child key left in the index range",
            ));
        }
        child = ChildNumber::new(next, child.is_hardened())?;
    }
}

impl fmt::Display for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("private", &self.is_private())
            .field("public_key", &hex::encode(self.public_key.serialize()))
            .field("depth", &self.depth)
            .field("parent_fingerprint", &hex::encode(self.parent_fingerprint))
            .field("child_number", &self.child_number.to_string())
            .field("network", &self.network)
            .finish()
    }
}

impl FromStr for ExtendedKey {
    type Err = KeysmithError;

    fn from_str(s: &str) -> KeysmithResult<Self> {
        Self::from_base58(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED_1: &str = "000102030405060708090a0b0c0d0e0f";

    fn master() -> ExtendedKey {
        ExtendedKey::new_master(&hex::decode(SEED_1).unwrap(), Network::Mainnet).unwrap()
    }

    #[test]
    fn test_master_vector() {
        let m = master();
        assert_eq!(
            m.to_base58(),
            "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi"
        );
        assert!(m.neuter().to_base58().starts_with("xpub661MyMwAqRbc"));
        assert_eq!(m.depth(), 0);
        assert_eq!(m.parent_fingerprint(), [0; 4]);
    }

    #[test]
    fn test_seed_length_rejected() {
        let err = ExtendedKey::new_master(&[1u8; 8], Network::Mainnet).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidSeed);
    }

    #[test]
    fn test_hardened_from_public_fails() {
        let public = master().neuter();
        let err = public.derive(0, true).unwrap_err();
        assert_eq!(err.code, ErrorCode::HardenedFromPublic);
    }

    #[test]
    fn test_public_derivation_matches_private() {
        let parent = master().derive(0, true).unwrap();
        let via_private = parent.derive(1, false).unwrap().derive(2, false).unwrap();
        let via_public = parent.neuter().derive(1, false).unwrap().derive(2, false).unwrap();
        assert_eq!(via_private.public_key(), via_public.public_key());
        assert_eq!(via_private.chain_code(), via_public.chain_code());
        assert_eq!(via_private.neuter(), via_public);
        assert!(via_public.private_key().is_err());
    }

    #[test]
    fn test_child_metadata() {
        let m = master();
        let child = m.derive(0, true).unwrap();
        assert_eq!(child.depth(), 1);
        assert_eq!(child.parent_fingerprint(), m.fingerprint());
        assert_eq!(child.child_number().to_raw(), HARDENED);
        assert_eq!(hex::encode(m.fingerprint()), "3442193e");
    }

    #[test]
    fn test_max_depth() {
        let mut bytes = *master().to_bytes();
        bytes[4] = u8::MAX;
        bytes[5..9].copy_from_slice(&[1, 2, 3, 4]);
        let deep = ExtendedKey::from_bytes(&bytes).unwrap();
        let err = deep.derive(0, false).unwrap_err();
        assert_eq!(err.code, ErrorCode::MaxDepthExceeded);
    }

    #[test]
    fn test_base58_round_trip_and_testnet_prefixes() {
        let m = ExtendedKey::new_master(&hex::decode(SEED_1).unwrap(), Network::Testnet).unwrap();
        let text = m.to_base58();
        assert!(text.starts_with("tprv"));
        assert!(m.neuter().to_base58().starts_with("tpub"));
        let parsed: ExtendedKey = text.parse().unwrap();
        assert_eq!(parsed, m);
        assert_eq!(parsed.network(), Network::Testnet);
    }

    #[test]
    fn test_rejects_corrupted_serialization() {
        let mut text = master().to_base58();
        text.pop();
        text.push('j');
        assert_eq!(
            ExtendedKey::from_base58(&text).unwrap_err().code,
            ErrorCode::Checksum
        );

        let mut bytes = *master().to_bytes();
        bytes[0] = 0xff;
        assert_eq!(
            ExtendedKey::from_bytes(&bytes).unwrap_err().code,
            ErrorCode::UnrecognizedKeyFormat
        );
    }

    #[test]
    fn test_skip_rule_moves_to_next_index() {
        let mut calls = 0;
        let (child, value) = next_valid_child(ChildNumber::normal(7).unwrap(), |c| {
            calls += 1;
            Ok(if c.index() < 9 { None } else { Some(c.index()) })
        })
        .unwrap();
        assert_eq!(calls, 3);
        assert_eq!(child.index(), 9);
        assert_eq!(value, 9);
    }

    #[test]
    fn test_skip_rule_keeps_hardened_flag_and_stops_at_range_end() {
        let (child, _) = next_valid_child(ChildNumber::hardened(0).unwrap(), |c| {
            Ok(if c.index() == 0 { None } else { Some(()) })
        })
        .unwrap();
        assert!(child.is_hardened());
        assert_eq!(child.to_raw(), HARDENED | 1);

        let err = next_valid_child::<()>(ChildNumber::normal(HARDENED - 1).unwrap(), |_| Ok(None))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidChildIndex);
    }

    #[test]
    fn test_debug_hides_secret() {
        let printed = format!("{:?}", master());
        assert!(printed.contains("private: true"));
        assert!(!printed.contains("xprv"));
    }
}
