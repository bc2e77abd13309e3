//! Structured stderr logging with secret redaction
//!
//! Key material never reaches the log: fields whose names look like secrets
//! are replaced wholesale, addresses and hashes are shortened.

use crate::error::{KeysmithError, KeysmithResult};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

/// Minimum level that gets written; defaults to `Warn`.
static THRESHOLD: AtomicU8 = AtomicU8::new(LogLevel::Warn as u8);

pub fn set_level(level: LogLevel) {
    THRESHOLD.store(level as u8, Ordering::SeqCst);
}

pub fn level() -> LogLevel {
    LogLevel::from_u8(THRESHOLD.load(Ordering::SeqCst))
}

pub fn is_enabled(level: LogLevel) -> bool {
    level as u8 >= THRESHOLD.load(Ordering::SeqCst)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = KeysmithError;

    fn from_str(s: &str) -> KeysmithResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(KeysmithError::validation(format!("unknown log level: {}", other))),
        }
    }
}

/// Structured log entry
#[derive(Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    pub module: &'static str,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LogEntry {
    pub fn new(level: LogLevel, module: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            module,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field; secret-looking keys are redacted.
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let value_str = value.to_string();
        let redacted = redact_if_sensitive(key, &value_str);
        self.fields.push((key, redacted));
        self
    }

    pub fn address_field(mut self, key: &'static str, address: &str) -> Self {
        self.fields.push((key, shorten(address, 8, 4)));
        self
    }

    /// Render without timestamp.
    pub fn render(&self) -> String {
        let mut line = format!("{} [{}] {}", self.level, self.module, self.message);
        if !self.fields.is_empty() {
            let fields = self
                .fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(" ");
            line.push_str(" | ");
            line.push_str(&fields);
        }
        line
    }

    pub fn log(self) {
        if !is_enabled(self.level) {
            return;
        }
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        eprintln!("[{}] {}", timestamp, self.render());
    }
}

const SECRET_KEYS: [&str; 11] = [
    "private", "secret", "seed", "mnemonic", "passphrase", "password", "wif", "xprv",
    "tprv", "chain_code", "ikm",
];

fn redact_if_sensitive(key: &str, value: &str) -> String {
    let key_lower = key.to_lowercase();

    if SECRET_KEYS.iter().any(|s| key_lower.contains(s)) {
        return if value.is_empty() {
            "[EMPTY]".to_string()
        } else {
            "[REDACTED]".to_string()
        };
    }
    if ["address", "recipient", "sender", "filter"]
        .iter()
        .any(|s| key_lower.contains(s))
    {
        return shorten(value, 8, 4);
    }
    if key_lower.contains("hash") {
        return shorten(value, 12, 6);
    }
    value.to_string()
}

fn shorten(value: &str, head: usize, tail: usize) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }
    if trimmed.len() <= head + tail + 3 || !trimmed.is_ascii() {
        return trimmed.to_string();
    }
    format!("{}...{}", &trimmed[..head], &trimmed[trimmed.len() - tail..])
}

#[macro_export]
macro_rules! log_debug {
    ($module:expr, $msg:expr) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Debug,
            $module,
            $msg
        ).log()
    };
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Debug,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

#[macro_export]
macro_rules! log_info {
    ($module:expr, $msg:expr) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Info,
            $module,
            $msg
        ).log()
    };
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Info,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

#[macro_export]
macro_rules! log_warn {
    ($module:expr, $msg:expr) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Warn,
            $module,
            $msg
        ).log()
    };
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Warn,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

#[macro_export]
macro_rules! log_error {
    ($module:expr, $msg:expr) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Error,
            $module,
            $msg
        ).log()
    };
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Error,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_fields_redacted() {
        assert_eq!(redact_if_sensitive("private_key", "9df5a907"), "[REDACTED]");
        assert_eq!(redact_if_sensitive("mnemonic", "abandon abandon"), "[REDACTED]");
        assert_eq!(redact_if_sensitive("chain_code", "00ff"), "[REDACTED]");
        assert_eq!(redact_if_sensitive("seed", ""), "[EMPTY]");
    }

    #[test]
    fn test_address_and_hash_shortened() {
        let addr = redact_if_sensitive("address", "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");
        assert_eq!(addr, "0x9858Ef...da94");

        let hash = redact_if_sensitive(
            "tx_hash",
            "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef",
        );
        assert!(hash.starts_with("0x1234567890"));
        assert!(hash.ends_with("abcdef"));
    }

    #[test]
    fn test_plain_fields_untouched() {
        assert_eq!(redact_if_sensitive("path", "m/44'/0'/0'/0/0"), "m/44'/0'/0'/0/0");
        assert_eq!(redact_if_sensitive("bits", "256"), "256");
    }

    #[test]
    fn test_render_line() {
        let entry = LogEntry::new(LogLevel::Info, "wallet", "derived")
            .field("chain", "bitcoin")
            .field("private_key", "secret");
        assert_eq!(
            entry.render(),
            "INFO [wallet] derived | chain=bitcoin private_key=[REDACTED]"
        );
    }

    #[test]
    fn test_level_parsing_and_ordering() {
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
        assert!(LogLevel::Error > LogLevel::Info);
        assert_eq!(LogLevel::from_u8(9), LogLevel::Error);
    }
}
