//! Key & address encoder
//!
//! Textual forms of keys and addresses: hex, Base58Check/WIF, P2PKH,
//! Keccak-derived Ethereum addresses and Bech32 Cosmos addresses.

pub mod address;
pub mod base58;
pub mod convert;
pub mod hex;
pub mod wif;

pub use address::{
    bech32_decode, bech32_encode, bitcoin_address, cosmos_address, cosmos_bech32_pubkey,
    decode_bitcoin_address, ethereum_address, ethereum_address_bytes, parse_ethereum_address,
    CosmosPublicKey,
};
pub use convert::{convert_key, convert_key_with, detect_format, parse_private_key, KeyFormat, ParsedPrivateKey};
pub use wif::{decode_wif, encode_wif, Wif};
