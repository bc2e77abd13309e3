//! Supported chains and their BIP-44 layout
//!
//! Each chain fixes the coin type of its derivation path and how its keys
//! and addresses are rendered as text.

use bitcoin::secp256k1::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::derivation_path::{coin_types, ChildNumber, DerivationPath};
use super::extended_key::{ExtendedKey, KeyPair};
use super::mnemonic::seed_from_phrase;
use crate::config::KeyConfig;
use crate::encoding::{self, CosmosPublicKey, Wif};
use crate::error::{KeysmithError, KeysmithResult};
use crate::log_debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Bitcoin,
    Ethereum,
    Cosmos,
}

impl Chain {
    pub const ALL: [Chain; 3] = [Chain::Bitcoin, Chain::Ethereum, Chain::Cosmos];

    pub fn name(self) -> &'static str {
        match self {
            Chain::Bitcoin => "bitcoin",
            Chain::Ethereum => "ethereum",
            Chain::Cosmos => "cosmos",
        }
    }

    /// SLIP-0044 coin type
    pub fn coin_type(self) -> u32 {
        match self {
            Chain::Bitcoin => coin_types::BITCOIN,
            Chain::Ethereum => coin_types::ETHEREUM,
            Chain::Cosmos => coin_types::COSMOS,
        }
    }

    /// `m/44'/coin'/0'/0`
    pub fn chain_path(self) -> KeysmithResult<DerivationPath> {
        DerivationPath::bip44_chain(self.coin_type(), 0, 0)
    }

    /// `m/44'/coin'/0'/0/index`
    pub fn derive_path(self, address_index: u32) -> KeysmithResult<DerivationPath> {
        DerivationPath::bip44(self.coin_type(), address_index)
    }

    pub fn encode_address(self, public_key: &PublicKey, config: &KeyConfig) -> KeysmithResult<String> {
        match self {
            Chain::Bitcoin => Ok(encoding::bitcoin_address(
                public_key,
                config.network,
                config.compressed,
            )),
            Chain::Ethereum => Ok(encoding::ethereum_address(public_key)),
            Chain::Cosmos => {
                encoding::cosmos_address(&CosmosPublicKey::Secp256k1(*public_key), &config.bech32)
            }
        }
    }

    /// Bitcoin: WIF; Ethereum: `0x`-hex; Cosmos: bare hex.
    pub fn encode_key(self, secret_key: &SecretKey, config: &KeyConfig) -> String {
        match self {
            Chain::Bitcoin => Wif::from_secret_key(secret_key, config.network, config.compressed).encode(),
            Chain::Ethereum => format!("0x{}", hex::encode(secret_key.secret_bytes())),
            Chain::Cosmos => hex::encode(secret_key.secret_bytes()),
        }
    }

    /// Bitcoin honours the compression flag; Ethereum keys are shown uncompressed.
    pub fn encode_public_key(self, public_key: &PublicKey, config: &KeyConfig) -> String {
        match self {
            Chain::Bitcoin if !config.compressed => hex::encode(public_key.serialize_uncompressed()),
            Chain::Ethereum => hex::encode(public_key.serialize_uncompressed()),
            _ => hex::encode(public_key.serialize()),
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Chain {
    type Err = KeysmithError;

    fn from_str(s: &str) -> KeysmithResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bitcoin" | "btc" => Ok(Chain::Bitcoin),
            "ethereum" | "eth" => Ok(Chain::Ethereum),
            "cosmos" | "atom" => Ok(Chain::Cosmos),
            other => Err(KeysmithError::unsupported_chain(other)),
        }
    }
}

// MARK: - Path walking

/// Derive the chain-level key `m/44'/coin'/0'/0` from a master key.
pub fn walk_path(master: &ExtendedKey, chain: Chain) -> KeysmithResult<ExtendedKey> {
    let path = chain.chain_path()?;
    log_debug!("chain", "walking chain path", chain = chain, path = path);
    master.derive_path(&path)
}

/// Non-hardened leaf below a chain-level key.
pub fn derive_at_index(chain_key: &ExtendedKey, address_index: u32) -> KeysmithResult<ExtendedKey> {
    chain_key.derive_child(ChildNumber::normal(address_index)?)
}

/// Everything shown for one derived address
#[derive(Debug, Clone)]
pub struct DerivedAccount {
    pub chain: Chain,
    pub path: DerivationPath,
    pub key_pair: KeyPair,
    pub private_key: String,
    pub public_key: String,
    pub address: String,
}

/// Mnemonic -> seed -> master -> chain key -> leaf -> address.
pub fn derive_account(
    phrase: &str,
    passphrase: &str,
    chain: Chain,
    address_index: u32,
    config: &KeyConfig,
) -> KeysmithResult<DerivedAccount> {
    let seed = seed_from_phrase(phrase, passphrase)?;
    let master = ExtendedKey::from_seed(&seed, config.network)?;
    account_from_master(&master, chain, address_index, config)
}

pub fn account_from_master(
    master: &ExtendedKey,
    chain: Chain,
    address_index: u32,
    config: &KeyConfig,
) -> KeysmithResult<DerivedAccount> {
    let chain_key = walk_path(master, chain)?;
    let leaf = derive_at_index(&chain_key, address_index)?;
    let key_pair = leaf.to_key_pair()?;

    Ok(DerivedAccount {
        chain,
        path: chain
            .chain_path()?
            .child(leaf.child_number()),
        private_key: chain.encode_key(&key_pair.secret_key, config),
        public_key: chain.encode_public_key(&key_pair.public_key, config),
        address: chain.encode_address(&key_pair.public_key, config)?,
        key_pair,
    })
}
