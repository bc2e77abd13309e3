//! Private key format detection and conversion between hex and WIF.

use super::hex::{decode_private_key_hex, is_hex_of_len, strip_prefix};
use super::wif::Wif;
use crate::config::{KeyConfig, Network};
use crate::error::{KeysmithError, KeysmithResult};
use bitcoin::secp256k1::SecretKey;
use std::fmt;

const WIF_MIN_LEN: usize = 51;
const WIF_MAX_LEN: usize = 52;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormat {
    Hex,
    Wif,
}

impl fmt::Display for KeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyFormat::Hex => write!(f, "hex"),
            KeyFormat::Wif => write!(f, "wif"),
        }
    }
}

/// A private key parsed from user input along with what the input implied about it
#[derive(Debug, Clone)]
pub struct ParsedPrivateKey {
    pub secret_key: SecretKey,
    pub format: KeyFormat,
    /// Present only for WIF input
    pub network: Option<Network>,
    pub compressed: bool,
}

fn looks_like_wif(input: &str) -> bool {
    (WIF_MIN_LEN..=WIF_MAX_LEN).contains(&input.len())
        && bs58::decode(input).into_vec().is_ok()
}

fn looks_like_hex(input: &str) -> bool {
    is_hex_of_len(input, 64) || (is_hex_of_len(input, 66) && strip_prefix(input).starts_with("00"))
}

/// Classify `input` as WIF or hex.
///
/// A 51-52 character Base58 string must carry a valid WIF checksum; a bad
/// checksum is reported as such rather than as an unknown format.
pub fn detect_format(input: &str) -> KeysmithResult<KeyFormat> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(KeysmithError::validation("private key is empty"));
    }
    if looks_like_wif(trimmed) {
        Wif::decode(trimmed)?;
        return Ok(KeyFormat::Wif);
    }
    if looks_like_hex(trimmed) {
        return Ok(KeyFormat::Hex);
    }
    Err(KeysmithError::unrecognized_format(format!(
        "expected a 64-digit hex key or a 51-52 character WIF, got {} characters",
        trimmed.len()
    )))
}

pub fn parse_private_key(input: &str) -> KeysmithResult<ParsedPrivateKey> {
    let trimmed = input.trim();
    match detect_format(trimmed)? {
        KeyFormat::Wif => {
            let wif = Wif::decode(trimmed)?;
            Ok(ParsedPrivateKey {
                secret_key: wif.secret_key()?,
                format: KeyFormat::Wif,
                network: Some(wif.network),
                compressed: wif.compressed,
            })
        }
        KeyFormat::Hex => {
            let bytes = decode_private_key_hex(trimmed)?;
            let secret_key = SecretKey::from_slice(&bytes).map_err(|_| {
                KeysmithError::invalid_private_key("private key is zero or exceeds the curve order")
            })?;
            Ok(ParsedPrivateKey {
                secret_key,
                format: KeyFormat::Hex,
                network: None,
                compressed: true,
            })
        }
    }
}

/// Hex becomes compressed mainnet WIF; WIF becomes bare lowercase hex.
pub fn convert_key(input: &str) -> KeysmithResult<String> {
    convert_key_with(input, &KeyConfig::default())
}

/// Like [`convert_key`], taking network and compression for hex -> WIF from `config`.
pub fn convert_key_with(input: &str, config: &KeyConfig) -> KeysmithResult<String> {
    let parsed = parse_private_key(input)?;
    Ok(match parsed.format {
        KeyFormat::Wif => hex::encode(parsed.secret_key.secret_bytes()),
        KeyFormat::Hex => {
            Wif::from_secret_key(&parsed.secret_key, config.network, config.compressed).encode()
        }
    })
}
