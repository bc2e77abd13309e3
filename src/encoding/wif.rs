//! Wallet Import Format
//!
//! Layout: `version ∥ 32-byte key [∥ 0x01] ∥ checksum`, Base58 text.
//! Mainnet keys start with `5` (uncompressed) or `K`/`L` (compressed),
//! testnet keys with `9` or `c`.

use super::base58;
use crate::config::Network;
use crate::error::{KeysmithError, KeysmithResult};
use bitcoin::secp256k1::SecretKey;
use std::fmt;
use zeroize::Zeroizing;

const COMPRESSION_FLAG: u8 = 0x01;
const UNCOMPRESSED_PAYLOAD_LEN: usize = 33;
const COMPRESSED_PAYLOAD_LEN: usize = 34;

/// A decoded WIF private key
#[derive(Clone)]
pub struct Wif {
    secret: Zeroizing<[u8; 32]>,
    pub network: Network,
    pub compressed: bool,
}

impl Wif {
    pub fn new(secret: [u8; 32], network: Network, compressed: bool) -> Self {
        Self {
            secret: Zeroizing::new(secret),
            network,
            compressed,
        }
    }

    pub fn from_secret_key(secret_key: &SecretKey, network: Network, compressed: bool) -> Self {
        Self::new(secret_key.secret_bytes(), network, compressed)
    }

    pub fn secret_bytes(&self) -> &[u8; 32] {
        &self.secret
    }

    pub fn secret_key(&self) -> KeysmithResult<SecretKey> {
        SecretKey::from_slice(self.secret.as_ref())
            .map_err(|_| KeysmithError::invalid_private_key("WIF key is outside the curve order"))
    }

    pub fn encode(&self) -> String {
        let mut payload = Zeroizing::new(Vec::with_capacity(COMPRESSED_PAYLOAD_LEN));
        payload.push(self.network.wif_version());
        payload.extend_from_slice(self.secret.as_ref());
        if self.compressed {
            payload.push(COMPRESSION_FLAG);
        }
        base58::encode_check(&payload)
    }

    pub fn decode(input: &str) -> KeysmithResult<Self> {
        let payload = Zeroizing::new(base58::decode_check(input)?);

        let compressed = match payload.len() {
            UNCOMPRESSED_PAYLOAD_LEN => false,
            COMPRESSED_PAYLOAD_LEN if payload[33] == COMPRESSION_FLAG => true,
            COMPRESSED_PAYLOAD_LEN => {
                return Err(KeysmithError::unrecognized_format(format!(
                    "invalid WIF compression flag 0x{:02x}",
                    payload[33]
                )))
            }
            n => {
                return Err(KeysmithError::unrecognized_format(format!(
                    "WIF payload must be 33 or 34 bytes, got {}",
                    n
                )))
            }
        };
        let network = Network::from_wif_version(payload[0]).ok_or_else(|| {
            KeysmithError::unrecognized_format(format!("unknown WIF version 0x{:02x}", payload[0]))
        })?;

        let mut secret = [0u8; 32];
        secret.copy_from_slice(&payload[1..33]);
        Ok(Self::new(secret, network, compressed))
    }
}

impl fmt::Debug for Wif {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wif")
            .field("secret", &"[REDACTED]")
            .field("network", &self.network)
            .field("compressed", &self.compressed)
            .finish()
    }
}

pub fn encode_wif(secret: &[u8; 32], network: Network, compressed: bool) -> String {
    Wif::new(*secret, network, compressed).encode()
}

pub fn decode_wif(input: &str) -> KeysmithResult<Wif> {
    Wif::decode(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::hex::decode_private_key_hex;
    use crate::error::ErrorCode;

    const KEY_HEX: &str = "9df5a907ff17ed6a4e02c00c2c119049a045f52a4e817b06b2ec54eb68f70079";
    const KEY_WIF: &str = "L2WmFR8WMr5GSprjt7UTA7WQ23WDEZPVRimrZv1dmz7e4JzxqSNq";

    #[test]
    fn test_known_compressed_mainnet_wif() {
        let secret = decode_private_key_hex(KEY_HEX).unwrap();
        assert_eq!(encode_wif(&secret, Network::Mainnet, true), KEY_WIF);

        let decoded = decode_wif(KEY_WIF).unwrap();
        assert_eq!(decoded.secret_bytes(), &secret);
        assert_eq!(decoded.network, Network::Mainnet);
        assert!(decoded.compressed);
    }

    #[test]
    fn test_prefix_characters() {
        let secret = decode_private_key_hex(KEY_HEX).unwrap();
        assert!(encode_wif(&secret, Network::Mainnet, false).starts_with('5'));
        assert!(encode_wif(&secret, Network::Testnet, true).starts_with('c'));
        assert!(encode_wif(&secret, Network::Testnet, false).starts_with('9'));
    }

    #[test]
    fn test_matches_bitcoin_crate() {
        let secret = decode_private_key_hex(KEY_HEX).unwrap();
        let sk = SecretKey::from_slice(&secret).unwrap();
        let mut expected = bitcoin::PrivateKey::new(sk, bitcoin::Network::Testnet);
        expected.compressed = false;
        assert_eq!(
            Wif::from_secret_key(&sk, Network::Testnet, false).encode(),
            expected.to_wif()
        );
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut tampered = KEY_WIF.to_string();
        tampered.pop();
        tampered.push('r');
        assert_eq!(decode_wif(&tampered).unwrap_err().code, ErrorCode::Checksum);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let wif = decode_wif(KEY_WIF).unwrap();
        let printed = format!("{:?}", wif);
        assert!(printed.contains("REDACTED"));
        assert!(!printed.contains("9df5"));
    }
}
