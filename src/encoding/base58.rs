//! Base58Check: payload followed by the first four bytes of its double SHA-256.

use crate::error::{KeysmithError, KeysmithResult};
use crate::utils::crypto::double_sha256;
use subtle::ConstantTimeEq;

pub const CHECKSUM_LEN: usize = 4;

pub fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = double_sha256(payload);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}

pub fn encode_check(payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(payload.len() + CHECKSUM_LEN);
    data.extend_from_slice(payload);
    data.extend_from_slice(&checksum(payload));
    bs58::encode(data).into_string()
}

/// Decode and verify, returning the payload without its checksum.
pub fn decode_check(input: &str) -> KeysmithResult<Vec<u8>> {
    let mut data = bs58::decode(input.trim()).into_vec()?;
    if data.len() <= CHECKSUM_LEN {
        return Err(KeysmithError::unrecognized_format(format!(
            "base58check payload too short ({} bytes)",
            data.len()
        )));
    }
    let split = data.len() - CHECKSUM_LEN;
    let expected = checksum(&data[..split]);
    if !bool::from(expected.ct_eq(&data[split..])) {
        return Err(KeysmithError::checksum("base58check checksum mismatch"));
    }
    data.truncate(split);
    Ok(data)
}
