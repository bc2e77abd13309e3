//! Mnemonic generation and seed derivation (BIP-39)
//!
//! SECURITY: entropy and seeds are wrapped in `Zeroizing` and cleared on drop.

use bip39::Mnemonic;
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use zeroize::Zeroizing;

use crate::error::{KeysmithError, KeysmithResult};
use crate::{log_debug, log_warn};

/// Entropy sizes accepted by BIP-39, in bits
pub const ENTROPY_SIZES: [usize; 5] = [128, 160, 192, 224, 256];

pub const SEED_LEN: usize = 64;

/// 64-byte BIP-39 seed
#[derive(Clone)]
pub struct Seed(Zeroizing<[u8; SEED_LEN]>);

impl Seed {
    pub fn from_bytes(bytes: [u8; SEED_LEN]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(&self.0[..]))
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed([REDACTED])")
    }
}

/// Generate a fresh mnemonic from `entropy_bits` of OS randomness.
pub fn generate_mnemonic(entropy_bits: usize) -> KeysmithResult<Mnemonic> {
    if !ENTROPY_SIZES.contains(&entropy_bits) {
        return Err(KeysmithError::validation(format!(
            "entropy must be one of {:?} bits, got {}",
            ENTROPY_SIZES, entropy_bits
        )));
    }

    let mut entropy = Zeroizing::new(vec![0u8; entropy_bits / 8]);
    OsRng.try_fill_bytes(entropy.as_mut_slice()).map_err(|e| {
        log_warn!("mnemonic", "secure random source unavailable");
        KeysmithError::entropy(format!("OS random source failed: {}", e))
    })?;

    let mnemonic = Mnemonic::from_entropy(entropy.as_slice())?;
    log_debug!("mnemonic", "generated mnemonic", bits = entropy_bits, words = mnemonic.word_count());
    Ok(mnemonic)
}

/// Parse a phrase, checking the wordlist and embedded checksum.
pub fn parse_mnemonic(phrase: &str) -> KeysmithResult<Mnemonic> {
    let normalized = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return Err(KeysmithError::validation("mnemonic is empty"));
    }
    Mnemonic::parse(normalized.as_str())
        .map_err(|e| KeysmithError::invalid_mnemonic(format!("invalid mnemonic: {}", e)))
}

pub fn validate_mnemonic(phrase: &str) -> bool {
    parse_mnemonic(phrase).is_ok()
}

/// PBKDF2-HMAC-SHA512, 2048 rounds, salt `"mnemonic" + passphrase`.
pub fn derive_seed(mnemonic: &Mnemonic, passphrase: &str) -> Seed {
    Seed::from_bytes(mnemonic.to_seed(passphrase))
}

/// Validate the phrase first, then derive its seed.
pub fn seed_from_phrase(phrase: &str, passphrase: &str) -> KeysmithResult<Seed> {
    let mnemonic = parse_mnemonic(phrase)?;
    Ok(derive_seed(&mnemonic, passphrase))
}
