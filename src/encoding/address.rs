//! Address derivation for Bitcoin (P2PKH), Ethereum and Cosmos-SDK chains.

use super::{base58, hex as hexcodec};
use crate::config::{Bech32Config, Network};
use crate::error::{KeysmithError, KeysmithResult};
use crate::utils::crypto::{hash160, keccak256, sha256_truncated, to_checksum_address};
use bech32::{FromBase32, ToBase32, Variant};
use bitcoin::secp256k1::PublicKey;

// MARK: - Bitcoin

/// Base58Check(version ∥ hash160(pubkey)), compressed or uncompressed serialization.
pub fn bitcoin_address(public_key: &PublicKey, network: Network, compressed: bool) -> String {
    let hash = if compressed {
        hash160(&public_key.serialize())
    } else {
        hash160(&public_key.serialize_uncompressed())
    };
    bitcoin_address_from_hash(&hash, network)
}

pub fn bitcoin_address_from_hash(pubkey_hash: &[u8; 20], network: Network) -> String {
    let mut payload = [0u8; 21];
    payload[0] = network.p2pkh_version();
    payload[1..].copy_from_slice(pubkey_hash);
    base58::encode_check(&payload)
}

/// Parse a P2PKH address back into its network and pubkey hash.
pub fn decode_bitcoin_address(address: &str) -> KeysmithResult<(Network, [u8; 20])> {
    let payload = base58::decode_check(address)?;
    if payload.len() != 21 {
        return Err(KeysmithError::unrecognized_format(format!(
            "P2PKH payload must be 21 bytes, got {}",
            payload.len()
        )));
    }
    let network = match payload[0] {
        0x00 => Network::Mainnet,
        0x6F => Network::Testnet,
        v => {
            return Err(KeysmithError::unrecognized_format(format!(
                "unknown address version 0x{:02x}",
                v
            )))
        }
    };
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&payload[1..]);
    Ok((network, hash))
}

// MARK: - Ethereum

/// Last 20 bytes of Keccak256 over the 64-byte uncompressed point.
pub fn ethereum_address_bytes(public_key: &PublicKey) -> [u8; 20] {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..]);
    out
}

/// EIP-55 checksummed `0x` address.
pub fn ethereum_address(public_key: &PublicKey) -> String {
    to_checksum_address(&ethereum_address_bytes(public_key))
}

/// Accepts any casing; mixed-case input must carry a valid EIP-55 checksum.
pub fn parse_ethereum_address(address: &str) -> KeysmithResult<[u8; 20]> {
    let trimmed = address.trim();
    if !trimmed.starts_with("0x") && !trimmed.starts_with("0X") {
        return Err(KeysmithError::validation("ethereum address must start with 0x"));
    }
    let bytes: [u8; 20] = hexcodec::decode_hex_array(trimmed, "ethereum address")?;

    let body = &trimmed[2..];
    let mixed = body.chars().any(|c| c.is_ascii_uppercase())
        && body.chars().any(|c| c.is_ascii_lowercase());
    if mixed && to_checksum_address(&bytes)[2..] != *body {
        return Err(KeysmithError::checksum("EIP-55 checksum mismatch"));
    }
    Ok(bytes)
}

// MARK: - Cosmos

const AMINO_SECP256K1_PREFIX: [u8; 5] = [0xeb, 0x5a, 0xe9, 0x87, 0x21];
const AMINO_ED25519_PREFIX: [u8; 5] = [0x16, 0x24, 0xde, 0x64, 0x20];

/// Public key of a Cosmos-SDK account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CosmosPublicKey {
    Secp256k1(PublicKey),
    Ed25519(ed25519_dalek::VerifyingKey),
}

impl CosmosPublicKey {
    /// Raw key bytes: 33-byte compressed point or 32-byte ed25519 key.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            CosmosPublicKey::Secp256k1(pk) => pk.serialize().to_vec(),
            CosmosPublicKey::Ed25519(pk) => pk.to_bytes().to_vec(),
        }
    }

    /// 20-byte account identifier
    pub fn address_bytes(&self) -> [u8; 20] {
        match self {
            CosmosPublicKey::Secp256k1(pk) => hash160(&pk.serialize()),
            CosmosPublicKey::Ed25519(pk) => sha256_truncated(pk.as_bytes()),
        }
    }

    /// Legacy amino encoding used under the `...pub` prefix
    pub fn amino_bytes(&self) -> Vec<u8> {
        let (prefix, key) = match self {
            CosmosPublicKey::Secp256k1(_) => (AMINO_SECP256K1_PREFIX, self.to_bytes()),
            CosmosPublicKey::Ed25519(_) => (AMINO_ED25519_PREFIX, self.to_bytes()),
        };
        let mut out = Vec::with_capacity(prefix.len() + key.len());
        out.extend_from_slice(&prefix);
        out.extend_from_slice(&key);
        out
    }
}

pub fn cosmos_address(public_key: &CosmosPublicKey, config: &Bech32Config) -> KeysmithResult<String> {
    config.validate()?;
    bech32_encode(&config.account_prefix, &public_key.address_bytes())
}

pub fn cosmos_bech32_pubkey(
    public_key: &CosmosPublicKey,
    config: &Bech32Config,
) -> KeysmithResult<String> {
    config.validate()?;
    bech32_encode(&config.pubkey_prefix, &public_key.amino_bytes())
}

pub fn bech32_encode(hrp: &str, data: &[u8]) -> KeysmithResult<String> {
    Ok(bech32::encode(hrp, data.to_base32(), Variant::Bech32)?)
}

/// Decode to `(hrp, payload)`; a bad checksum yields `ErrorCode::Checksum`.
pub fn bech32_decode(input: &str) -> KeysmithResult<(String, Vec<u8>)> {
    let (hrp, data, variant) = bech32::decode(input.trim())?;
    if variant != Variant::Bech32 {
        return Err(KeysmithError::encoding("expected bech32, found bech32m"));
    }
    let bytes = Vec::<u8>::from_base32(&data)?;
    Ok((hrp, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use bitcoin::secp256k1::{Secp256k1, SecretKey};

    fn key(hex_key: &str) -> PublicKey {
        let secp = Secp256k1::new();
        let sk = SecretKey::from_slice(&hex::decode(hex_key).unwrap()).unwrap();
        PublicKey::from_secret_key(&secp, &sk)
    }

    #[test]
    fn test_known_bitcoin_address() {
        let pk = key("9df5a907ff17ed6a4e02c00c2c119049a045f52a4e817b06b2ec54eb68f70079");
        assert_eq!(
            bitcoin_address(&pk, Network::Mainnet, true),
            "1EoxGLjv4ZADtRBjTVeXY35czVyDdp7rU4"
        );
    }

    #[test]
    fn test_bitcoin_address_matches_bitcoin_crate() {
        let pk = key("9df5a907ff17ed6a4e02c00c2c119049a045f52a4e817b06b2ec54eb68f70079");
        let expected =
            bitcoin::Address::p2pkh(bitcoin::PublicKey::new(pk), bitcoin::Network::Testnet);
        let ours = bitcoin_address(&pk, Network::Testnet, true);
        assert_eq!(ours, expected.to_string());
        assert!(ours.starts_with('m') || ours.starts_with('n'));

        let (network, hash) = decode_bitcoin_address(&ours).unwrap();
        assert_eq!(network, Network::Testnet);
        assert_eq!(hash, hash160(&pk.serialize()));
    }

    #[test]
    fn test_known_ethereum_address() {
        let pk = key("4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318");
        let addr = ethereum_address(&pk);
        assert_eq!(addr, "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23");
        assert_eq!(
            hex::encode(ethereum_address_bytes(&pk)),
            "2c7536e3605d9c16a7a3d7b1898e529396a65c23"
        );
        assert_eq!(parse_ethereum_address(&addr).unwrap(), ethereum_address_bytes(&pk));
        assert!(parse_ethereum_address(&addr.to_lowercase()).is_ok());
    }

    #[test]
    fn test_ethereum_bad_checksum_casing() {
        let err = parse_ethereum_address("0x2C7536e3605D9C16a7a3D7b1898e529396a65c23").unwrap_err();
        assert_eq!(err.code, ErrorCode::Checksum);
    }

    #[test]
    fn test_cosmos_prefix_is_a_parameter() {
        let pk = CosmosPublicKey::Secp256k1(key(
            "9df5a907ff17ed6a4e02c00c2c119049a045f52a4e817b06b2ec54eb68f70079",
        ));
        let cosmos = cosmos_address(&pk, &Bech32Config::new("cosmos")).unwrap();
        let osmo = cosmos_address(&pk, &Bech32Config::new("osmo")).unwrap();
        assert!(cosmos.starts_with("cosmos1"));
        assert!(osmo.starts_with("osmo1"));
        assert_ne!(cosmos, osmo);

        let (hrp_a, bytes_a) = bech32_decode(&cosmos).unwrap();
        let (hrp_b, bytes_b) = bech32_decode(&osmo).unwrap();
        assert_eq!((hrp_a.as_str(), hrp_b.as_str()), ("cosmos", "osmo"));
        assert_eq!(bytes_a, bytes_b);
        assert_eq!(bytes_a, pk.address_bytes().to_vec());
    }

    #[test]
    fn test_cosmos_pubkey_encoding() {
        let pk = CosmosPublicKey::Secp256k1(key(
            "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
        ));
        let encoded = cosmos_bech32_pubkey(&pk, &Bech32Config::default()).unwrap();
        assert!(encoded.starts_with("cosmospub1"));
        let (_, bytes) = bech32_decode(&encoded).unwrap();
        assert_eq!(&bytes[..5], &AMINO_SECP256K1_PREFIX);
        assert_eq!(bytes.len(), 38);
    }

    #[test]
    fn test_cosmos_ed25519_address_bytes() {
        let signing = ed25519_dalek::SigningKey::from_bytes(&[7u8; 32]);
        let pk = CosmosPublicKey::Ed25519(signing.verifying_key());
        assert_eq!(pk.address_bytes(), sha256_truncated(signing.verifying_key().as_bytes()));
        assert_eq!(pk.amino_bytes().len(), 37);
    }

    #[test]
    fn test_bech32_checksum_error() {
        let pk = CosmosPublicKey::Secp256k1(key(
            "9df5a907ff17ed6a4e02c00c2c119049a045f52a4e817b06b2ec54eb68f70079",
        ));
        let mut addr = cosmos_address(&pk, &Bech32Config::default()).unwrap();
        let last = addr.pop().unwrap();
        addr.push(if last == 'q' { 'p' } else { 'q' });
        assert_eq!(bech32_decode(&addr).unwrap_err().code, ErrorCode::Checksum);
    }
}
