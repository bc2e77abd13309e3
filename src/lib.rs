//! Keysmith Core Library
//!
//! Multi-chain key management: mnemonics, hierarchical key trees, chain
//! encodings and signatures for Bitcoin, Ethereum and Cosmos-SDK chains.
//!
//! # Architecture
//!
//! This crate provides:
//! - **wallet**: BIP-39 mnemonics and seeds, BIP-32 extended keys, BIP-44 chain paths
//! - **encoding**: hex, WIF, Base58Check, P2PKH, EIP-55 and Bech32 encodings
//! - **crypto**: ECDSA (secp256k1, P-256), BIP-340 Schnorr and BLS12-381 signatures
//! - **mempool**: pending-transaction subscription loop
//! - **report**: labeled-line command output
//!
//! # Security
//!
//! Seeds, secret scalars and decoded WIF payloads are wrapped in `zeroize`
//! containers and cleared on drop. `Debug` output never contains key material.
//!
//! # Example
//!
//! ```rust,ignore
//! use keysmith::{derive_account, Chain, KeyConfig};
//!
//! let account = derive_account(phrase, "", Chain::Bitcoin, 0, &KeyConfig::default())?;
//! println!("Address: {}", account.address);
//! ```

pub mod config;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod mempool;
pub mod report;
pub mod utils;
pub mod wallet;

pub use config::{Algorithm, Bech32Config, KeyConfig, Network};
pub use error::{ErrorCode, KeysmithError, KeysmithResult};
pub use report::Report;

pub use wallet::{
    derive_account, derive_seed, generate_mnemonic, parse_mnemonic, validate_mnemonic, Chain,
    ChildNumber, DerivationPath, DerivedAccount, ExtendedKey, KeyPair, Seed,
};

pub use encoding::{convert_key, convert_key_with, KeyFormat};

pub use utils::crypto::{keccak256, to_checksum_address};
