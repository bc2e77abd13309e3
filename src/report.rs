//! Labeled-line output of a command
//!
//! Every command result is a list of `Label: value` lines, printed in
//! insertion order. The same report can be rendered as a JSON object.

use serde::Serialize;
use std::fmt;

use crate::error::KeysmithResult;

pub mod labels {
    pub const PRIVATE_KEY: &str = "Private Key";
    pub const PUBLIC_KEY: &str = "Public Key";
    pub const ADDRESS: &str = "Address";
    pub const SIGNATURE: &str = "Signature";
    pub const SIGNATURE_VALID: &str = "Signature is valid";
    pub const MNEMONIC: &str = "Mnemonic";
    pub const SEED: &str = "Seed";
    pub const PATH: &str = "Path";
    pub const WIF: &str = "WIF";
    pub const HEX: &str = "Hex";
    pub const EXTENDED_PRIVATE_KEY: &str = "Extended Private Key";
    pub const EXTENDED_PUBLIC_KEY: &str = "Extended Public Key";
    pub const NETWORK: &str = "Network";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    lines: Vec<ReportLine>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(mut self, label: impl Into<String>, value: impl fmt::Display) -> Self {
        self.push(label, value);
        self
    }

    pub fn push(&mut self, label: impl Into<String>, value: impl fmt::Display) {
        self.lines.push(ReportLine {
            label: label.into(),
            value: value.to_string(),
        });
    }

    /// Append another report's lines, e.g. one block per derived index.
    pub fn extend(&mut self, other: Report) {
        self.lines.extend(other.lines);
    }

    pub fn lines(&self) -> &[ReportLine] {
        &self.lines
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.lines
            .iter()
            .find(|l| l.label == label)
            .map(|l| l.value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Array of `{label, value}` objects, preserving order.
    pub fn to_json(&self) -> KeysmithResult<String> {
        Ok(serde_json::to_string_pretty(&self.lines)?)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}: {}", line.label, line.value)?;
        }
        Ok(())
    }
}
