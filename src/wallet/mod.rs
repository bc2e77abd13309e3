//! Hierarchical deterministic wallet
//!
//! mnemonic -> seed -> master extended key -> chain key -> leaf key pair.

pub mod chain;
pub mod derivation_path;
pub mod extended_key;
pub mod mnemonic;

pub use chain::{account_from_master, derive_account, derive_at_index, walk_path, Chain, DerivedAccount};
pub use derivation_path::{ChildNumber, DerivationPath, HARDENED};
pub use extended_key::{ExtendedKey, KeyPair};
pub use mnemonic::{
    derive_seed, generate_mnemonic, parse_mnemonic, seed_from_phrase, validate_mnemonic, Seed,
};

pub use bip39::Mnemonic;
