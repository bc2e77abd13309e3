//! BIP-32 derivation paths
//!
//! `m/44'/60'/0'/0/7` style paths: an ordered list of 31-bit indices, each
//! optionally hardened. `'`, `h` and `H` all mark a hardened segment.

use std::fmt;
use std::str::FromStr;

use crate::error::{ErrorCode, KeysmithError, KeysmithResult};

/// Standard BIP purposes
pub mod bip_purposes {
    pub const BIP44: u32 = 44;
}

/// Coin types from SLIP-0044
pub mod coin_types {
    pub const BITCOIN: u32 = 0;
    pub const ETHEREUM: u32 = 60;
    pub const COSMOS: u32 = 118;
}

/// Hardened offset for BIP-32 derivation
pub const HARDENED: u32 = 0x8000_0000;

/// Single segment of a derivation path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChildNumber {
    index: u32,
    hardened: bool,
}

impl ChildNumber {
    /// `index` must be below 2^31.
    pub fn new(index: u32, hardened: bool) -> KeysmithResult<Self> {
        if index >= HARDENED {
            return Err(KeysmithError::new(
                ErrorCode::InvalidChildIndex,
                format!("child index {} exceeds 2^31 - 1", index),
            ));
        }
        Ok(Self { index, hardened })
    }

    pub fn normal(index: u32) -> KeysmithResult<Self> {
        Self::new(index, false)
    }

    pub fn hardened(index: u32) -> KeysmithResult<Self> {
        Self::new(index, true)
    }

    /// Interpret a raw 32-bit child number as serialized in an extended key.
    pub fn from_raw(raw: u32) -> Self {
        Self {
            index: raw & !HARDENED,
            hardened: raw & HARDENED != 0,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn is_hardened(&self) -> bool {
        self.hardened
    }

    /// Index including the hardened bit
    pub fn to_raw(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED
        } else {
            self.index
        }
    }
}

impl fmt::Display for ChildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

impl FromStr for ChildNumber {
    type Err = KeysmithError;

    fn from_str(s: &str) -> KeysmithResult<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(KeysmithError::validation("empty path component"));
        }

        let (number, hardened) = match trimmed.strip_suffix(|c: char| c == '\'' || c == 'h' || c == 'H') {
            Some(rest) => (rest, true),
            None => (trimmed, false),
        };

        let index: u32 = number.parse().map_err(|e| {
            KeysmithError::validation(format!("invalid path component '{}': {}", s, e))
        })?;
        ChildNumber::new(index, hardened)
    }
}

/// Parsed derivation path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DerivationPath(Vec<ChildNumber>);

impl DerivationPath {
    pub fn master() -> Self {
        Self(Vec::new())
    }

    pub fn from_components(components: Vec<ChildNumber>) -> Self {
        Self(components)
    }

    /// `m/44'/coin'/account'/change`, the chain-level prefix of a BIP-44 path.
    pub fn bip44_chain(coin_type: u32, account: u32, change: u32) -> KeysmithResult<Self> {
        Ok(Self(vec![
            ChildNumber::hardened(bip_purposes::BIP44)?,
            ChildNumber::hardened(coin_type)?,
            ChildNumber::hardened(account)?,
            ChildNumber::normal(change)?,
        ]))
    }

    /// `m/44'/coin'/0'/0/index`
    pub fn bip44(coin_type: u32, address_index: u32) -> KeysmithResult<Self> {
        Ok(Self::bip44_chain(coin_type, 0, 0)?.child(ChildNumber::normal(address_index)?))
    }

    pub fn child(&self, component: ChildNumber) -> Self {
        let mut components = self.0.clone();
        components.push(component);
        Self(components)
    }

    pub fn components(&self) -> &[ChildNumber] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_master(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for component in &self.0 {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = KeysmithError;

    fn from_str(path: &str) -> KeysmithResult<Self> {
        let trimmed = path.trim();
        let rest = match trimmed {
            "m" | "M" => return Ok(Self::master()),
            _ => trimmed
                .strip_prefix("m/")
                .or_else(|| trimmed.strip_prefix("M/"))
                .ok_or_else(|| {
                    KeysmithError::validation(format!(
                        "derivation path must start with 'm/': {}",
                        path
                    ))
                })?,
        };

        let components = rest
            .split('/')
            .map(ChildNumber::from_str)
            .collect::<KeysmithResult<Vec<_>>>()?;
        Ok(Self(components))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_path() {
        let path: DerivationPath = "m/44'/60'/0'/0/7".parse().unwrap();
        let c = path.components();
        assert_eq!(c.len(), 5);
        assert!(c[0].is_hardened() && c[0].index() == 44);
        assert_eq!(c[1].to_raw(), 60 | HARDENED);
        assert!(!c[3].is_hardened());
        assert_eq!(c[4].index(), 7);
        assert_eq!(path.to_string(), "m/44'/60'/0'/0/7");
    }

    #[test]
    fn test_hardened_markers() {
        let a: DerivationPath = "m/44h/118H/0'".parse().unwrap();
        assert_eq!(a.to_string(), "m/44'/118'/0'");
    }

    #[test]
    fn test_bip44_constructor() {
        assert_eq!(
            DerivationPath::bip44(coin_types::COSMOS, 3).unwrap().to_string(),
            "m/44'/118'/0'/0/3"
        );
        assert_eq!(
            DerivationPath::bip44_chain(coin_types::BITCOIN, 0, 0).unwrap().to_string(),
            "m/44'/0'/0'/0"
        );
    }

    #[test]
    fn test_master_path() {
        let m: DerivationPath = "m".parse().unwrap();
        assert!(m.is_master());
        assert_eq!(m.to_string(), "m");
    }

    #[test]
    fn test_rejects_bad_paths() {
        assert!("44'/0'".parse::<DerivationPath>().is_err());
        assert!("m/".parse::<DerivationPath>().is_err());
        assert!("m/abc".parse::<DerivationPath>().is_err());
        let err = "m/2147483648".parse::<DerivationPath>().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidChildIndex);
    }

    #[test]
    fn test_raw_child_numbers() {
        let hardened = ChildNumber::from_raw(HARDENED | 5);
        assert!(hardened.is_hardened());
        assert_eq!(hardened.index(), 5);
        assert_eq!(hardened.to_raw(), HARDENED | 5);
        assert_eq!(ChildNumber::from_raw(5).to_string(), "5");
    }
}
