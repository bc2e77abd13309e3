//! Hex text <-> raw bytes.

use crate::error::{KeysmithError, KeysmithResult};

/// Drop surrounding whitespace and an optional `0x`/`0X` prefix.
pub fn strip_prefix(input: &str) -> &str {
    let trimmed = input.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
}

pub fn decode_hex(input: &str) -> KeysmithResult<Vec<u8>> {
    let body = strip_prefix(input);
    if body.len() % 2 != 0 {
        return Err(KeysmithError::invalid_hex(format!(
            "odd-length hex string ({} digits)",
            body.len()
        )));
    }
    Ok(hex::decode(body)?)
}

/// Decode into a fixed-size array, failing with `what` in the message on a length mismatch.
pub fn decode_hex_array<const N: usize>(input: &str, what: &str) -> KeysmithResult<[u8; N]> {
    let bytes = decode_hex(input)?;
    bytes.as_slice().try_into().map_err(|_| {
        KeysmithError::invalid_hex(format!(
            "{} must be {} bytes, got {}",
            what,
            N,
            bytes.len()
        ))
    })
}

/// Decode a 32-byte private scalar, tolerating a redundant leading zero byte.
pub fn decode_private_key_hex(input: &str) -> KeysmithResult<[u8; 32]> {
    let bytes = decode_hex(input)?;
    let body = match bytes.len() {
        32 => &bytes[..],
        33 if bytes[0] == 0x00 => &bytes[1..],
        0 => return Err(KeysmithError::validation("private key is empty")),
        n => {
            return Err(KeysmithError::invalid_hex(format!(
                "private key must be 32 bytes, got {}",
                n
            )))
        }
    };
    let mut out = [0u8; 32];
    out.copy_from_slice(body);
    Ok(out)
}

/// True if `input` is exactly `digits` hex characters after prefix stripping.
pub fn is_hex_of_len(input: &str, digits: usize) -> bool {
    let body = strip_prefix(input);
    body.len() == digits && body.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_prefix_is_optional() {
        assert_eq!(decode_hex("0xdeadbeef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(decode_hex("DEADBEEF").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(decode_hex(" 0X00ff ").unwrap(), vec![0x00, 0xff]);
    }

    #[test]
    fn test_rejects_odd_and_non_hex() {
        assert_eq!(decode_hex("abc").unwrap_err().code, ErrorCode::InvalidHex);
        assert_eq!(decode_hex("0xzz").unwrap_err().code, ErrorCode::InvalidHex);
    }

    #[test]
    fn test_private_key_strips_redundant_byte() {
        let key = "9df5a907ff17ed6a4e02c00c2c119049a045f52a4e817b06b2ec54eb68f70079";
        let padded = format!("00{}", key);
        assert_eq!(
            decode_private_key_hex(&padded).unwrap(),
            decode_private_key_hex(key).unwrap()
        );
        assert_eq!(
            decode_private_key_hex("").unwrap_err().code,
            ErrorCode::Validation
        );
        assert_eq!(
            decode_private_key_hex("0102").unwrap_err().code,
            ErrorCode::InvalidHex
        );
    }

    #[test]
    fn test_fixed_array_length() {
        let arr: [u8; 2] = decode_hex_array("0x0102", "pair").unwrap();
        assert_eq!(arr, [1, 2]);
        let err = decode_hex_array::<4>("0102", "word").unwrap_err();
        assert!(err.message.contains("word must be 4 bytes"));
    }

    #[test]
    fn test_is_hex_of_len() {
        assert!(is_hex_of_len("0xabcd", 4));
        assert!(!is_hex_of_len("abcg", 4));
        assert!(!is_hex_of_len("abc", 4));
    }
}
