//! Per-invocation configuration
//!
//! The library never reads process-wide or environment state. Callers build
//! a `KeyConfig` once per invocation and pass it into the encoding calls
//! that need it.

use crate::error::{KeysmithError, KeysmithResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bitcoin-family network selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    /// Leading byte of a WIF payload
    pub fn wif_version(self) -> u8 {
        match self {
            Network::Mainnet => 0x80,
            Network::Testnet => 0xEF,
        }
    }

    /// Leading byte of a P2PKH address payload
    pub fn p2pkh_version(self) -> u8 {
        match self {
            Network::Mainnet => 0x00,
            Network::Testnet => 0x6F,
        }
    }

    pub fn xprv_version(self) -> [u8; 4] {
        match self {
            Network::Mainnet => [0x04, 0x88, 0xAD, 0xE4],
            Network::Testnet => [0x04, 0x35, 0x83, 0x94],
        }
    }

    pub fn xpub_version(self) -> [u8; 4] {
        match self {
            Network::Mainnet => [0x04, 0x88, 0xB2, 0x1E],
            Network::Testnet => [0x04, 0x35, 0x87, 0xCF],
        }
    }

    pub fn from_wif_version(version: u8) -> Option<Self> {
        match version {
            0x80 => Some(Network::Mainnet),
            0xEF => Some(Network::Testnet),
            _ => None,
        }
    }

    pub fn from_testnet_flag(testnet: bool) -> Self {
        if testnet {
            Network::Testnet
        } else {
            Network::Mainnet
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = KeysmithError;

    fn from_str(s: &str) -> KeysmithResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            other => Err(KeysmithError::validation(format!("unknown network: {}", other))),
        }
    }
}

/// Human-readable prefixes for Bech32 encodings of one Cosmos-SDK chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bech32Config {
    pub account_prefix: String,
    pub pubkey_prefix: String,
}

impl Bech32Config {
    /// Derive both prefixes from the chain's account prefix (`osmo` -> `osmo`, `osmopub`).
    pub fn new(account_prefix: impl Into<String>) -> Self {
        let account_prefix = account_prefix.into();
        let pubkey_prefix = format!("{}pub", account_prefix);
        Self {
            account_prefix,
            pubkey_prefix,
        }
    }

    pub fn validate(&self) -> KeysmithResult<()> {
        for prefix in [&self.account_prefix, &self.pubkey_prefix] {
            let valid = !prefix.is_empty()
                && prefix.len() <= 83
                && prefix
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
            if !valid {
                return Err(KeysmithError::validation(format!(
                    "invalid bech32 prefix: {:?}",
                    prefix
                )));
            }
        }
        Ok(())
    }
}

impl Default for Bech32Config {
    fn default() -> Self {
        Self::new("cosmos")
    }
}

/// Options threaded through every key and address encoding call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyConfig {
    pub network: Network,
    pub compressed: bool,
    pub bech32: Bech32Config,
}

impl KeyConfig {
    pub fn testnet() -> Self {
        Self {
            network: Network::Testnet,
            ..Self::default()
        }
    }

    pub fn with_network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    pub fn with_compressed(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    pub fn with_bech32(mut self, bech32: Bech32Config) -> Self {
        self.bech32 = bech32;
        self
    }
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            compressed: true,
            bech32: Bech32Config::default(),
        }
    }
}

/// Signature algorithm selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// ECDSA over NIST P-256
    Ecdsa,
    /// ECDSA over secp256k1
    Secp256k1,
    Schnorr,
    Bls,
}

impl Algorithm {
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Ecdsa => "ecdsa",
            Algorithm::Secp256k1 => "secp256k1",
            Algorithm::Schnorr => "schnorr",
            Algorithm::Bls => "bls",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = KeysmithError;

    fn from_str(s: &str) -> KeysmithResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ecdsa" | "p256" | "secp256r1" => Ok(Algorithm::Ecdsa),
            "secp256k1" => Ok(Algorithm::Secp256k1),
            "schnorr" | "bip340" => Ok(Algorithm::Schnorr),
            "bls" | "bls12-381" => Ok(Algorithm::Bls),
            other => Err(KeysmithError::unsupported_algorithm(other)),
        }
    }
}
