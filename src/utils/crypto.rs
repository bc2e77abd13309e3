//! Digest helpers shared by the encoders and signature engine.

use crate::error::{KeysmithError, KeysmithResult};
use bitcoin::hashes::{hash160, sha256, sha256d, Hash};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};
use tiny_keccak::{Hasher, Keccak};

type HmacSha512 = Hmac<Sha512>;

/// Keccak256 hash (used for Ethereum addresses and message digests)
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(data));
    out
}

/// SHA256(SHA256(data)), the Base58Check checksum source
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256d::Hash::hash(data).to_byte_array()
}

/// RIPEMD160(SHA256(data))
pub fn hash160(data: &[u8]) -> [u8; 20] {
    hash160::Hash::hash(data).to_byte_array()
}

/// First 20 bytes of SHA256, the Tendermint ed25519 address rule
pub fn sha256_truncated(data: &[u8]) -> [u8; 20] {
    let digest = sha256::Hash::hash(data).to_byte_array();
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest[..20]);
    out
}

/// HMAC-SHA512 split into its left and right 32-byte halves
pub fn hmac_sha512(key: &[u8], data: &[u8]) -> KeysmithResult<([u8; 32], [u8; 32])> {
    let mut mac = HmacSha512::new_from_slice(key)
        .map_err(|e| KeysmithError::internal(format!("HMAC init failed: {}", e)))?;
    mac.update(data);
    let digest = mac.finalize().into_bytes();

    let mut left = [0u8; 32];
    let mut right = [0u8; 32];
    left.copy_from_slice(&digest[..32]);
    right.copy_from_slice(&digest[32..]);
    Ok((left, right))
}

/// EIP-55 mixed-case rendering of a 20-byte address
pub fn to_checksum_address(address: &[u8]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut result = String::with_capacity(2 + lower.len());
    result.push_str("0x");
    for (i, ch) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if ch.is_ascii_alphabetic() && nibble >= 8 {
            result.push(ch.to_ascii_uppercase());
        } else {
            result.push(ch);
        }
    }
    result
}
