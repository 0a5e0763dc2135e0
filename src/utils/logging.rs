//! Structured Logging with Sensitive Data Redaction
//!
//! Log lines go to stderr so stdout stays reserved for command results.
//! Each field is classified by its key before it is rendered: secrets are
//! replaced outright, addresses keep a short prefix and suffix, and long
//! hashes are shortened.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{SecondsFormat, Utc};

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Turn on debug lines (`--verbose`)
pub fn enable_debug() {
    DEBUG_ENABLED.store(true, Ordering::SeqCst);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::SeqCst)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        })
    }
}

/// How a field value is shown, decided from its key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sensitivity {
    Secret,
    Address,
    Hash,
    Plain,
}

const SECRET_KEYS: &[&str] = &[
    "private", "secret", "seed", "mnemonic", "phrase", "passphrase", "password", "entropy",
    "xprv", "chain_code",
];
const ADDRESS_KEYS: &[&str] = &["address", "signer"];
const HASH_KEYS: &[&str] = &["hash", "separator", "digest"];

impl Sensitivity {
    fn of(key: &str) -> Self {
        let key = key.to_lowercase();
        let matches = |keys: &[&str]| keys.iter().any(|k| key.contains(k));

        if matches(SECRET_KEYS) {
            Sensitivity::Secret
        } else if matches(ADDRESS_KEYS) {
            Sensitivity::Address
        } else if matches(HASH_KEYS) {
            Sensitivity::Hash
        } else {
            Sensitivity::Plain
        }
    }

    fn apply(self, value: &str) -> String {
        let value = value.trim();
        if value.is_empty() {
            return "[EMPTY]".to_string();
        }
        match self {
            Sensitivity::Secret => redact_value(value),
            Sensitivity::Address => mask_address(value),
            Sensitivity::Hash => shorten_hash(value),
            Sensitivity::Plain => value.to_string(),
        }
    }
}

/// One log line: level, emitting module, message and key=value fields
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

    /// Attach a field; the value is redacted according to `key`
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let shown = Sensitivity::of(key).apply(&value.to_string());
        self.fields.push((key, shown));
        self
    }

    /// The line without its timestamp
    pub fn render(&self) -> String {
        let mut line = format!("{} [{}] {}", self.level, self.module, self.message);
        if !self.fields.is_empty() {
            let fields: Vec<String> = self
                .fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            line.push_str(" | ");
            line.push_str(&fields.join(" "));
        }
        line
    }

    pub fn log(self) {
        if self.level == LogLevel::Debug && !is_debug_enabled() {
            return;
        }
        eprintln!(
            "[{}] {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            self.render()
        );
    }
}

fn redact_value(value: &str) -> String {
    match value.chars().count() {
        0..=4 => "[REDACTED]".to_string(),
        len => format!("[REDACTED:{}chars]", len),
    }
}

/// `0x9858Ef...da94`
fn mask_address(address: &str) -> String {
    let prefix_len = if address.starts_with("0x") { 8 } else { 6 };
    if !address.is_ascii() || address.len() <= prefix_len + 7 {
        return redact_value(address);
    }
    format!("{}...{}", &address[..prefix_len], &address[address.len() - 4..])
}

fn shorten_hash(hash: &str) -> String {
    if hash.len() <= 20 || !hash.is_ascii() {
        return hash.to_string();
    }
    let prefix_len = if hash.starts_with("0x") { 12 } else { 10 };
    format!("{}...{}", &hash[..prefix_len], &hash[hash.len() - 6..])
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_at {
    ($level:ident, $module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::$level,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

/// Debug line, shown only under `--verbose`
#[macro_export]
macro_rules! log_debug {
    ($($args:tt)+) => { $crate::__log_at!(Debug, $($args)+) };
}

#[macro_export]
macro_rules! log_info {
    ($($args:tt)+) => { $crate::__log_at!(Info, $($args)+) };
}

#[macro_export]
macro_rules! log_warn {
    ($($args:tt)+) => { $crate::__log_at!(Warn, $($args)+) };
}

#[macro_export]
macro_rules! log_error {
    ($($args:tt)+) => { $crate::__log_at!(Error, $($args)+) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_keys() {
        assert_eq!(Sensitivity::of("mnemonic"), Sensitivity::Secret);
        assert_eq!(Sensitivity::of("private_key"), Sensitivity::Secret);
        assert_eq!(Sensitivity::of("Seed_Hex"), Sensitivity::Secret);
        assert_eq!(Sensitivity::of("signer"), Sensitivity::Address);
        assert_eq!(Sensitivity::of("domain_separator"), Sensitivity::Hash);
        assert_eq!(Sensitivity::of("word_count"), Sensitivity::Plain);
    }

    #[test]
    fn test_secret_values() {
        assert_eq!(Sensitivity::Secret.apply(""), "[EMPTY]");
        assert_eq!(Sensitivity::Secret.apply("abc"), "[REDACTED]");
        assert_eq!(
            Sensitivity::Secret.apply("secret_key_12345"),
            "[REDACTED:16chars]"
        );
    }

    #[test]
    fn test_address_mask() {
        assert_eq!(
            mask_address("0x9858EfFD232B4033E47d90003D41EC34EcaEda94"),
            "0x9858Ef...da94"
        );
        assert_eq!(mask_address("0x1234"), "[REDACTED:6chars]");
    }

    #[test]
    fn test_hash_shortening() {
        let hash = "0xbe609aee343fb3c4b28e1df9e632fca64fcfaede20f02e86244efddf30957bd2";
        assert_eq!(shorten_hash(hash), "0xbe609aee34...957bd2");
        assert_eq!(shorten_hash("0xabcd"), "0xabcd");
    }

    #[test]
    fn test_render_redacts_fields() {
        let entry = LogEntry::new(LogLevel::Info, "derive", "Derived account")
            .field("path", "m/44'/60'/0'/0/0")
            .field("passphrase", "TREZOR")
            .field("address", "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");

        let line = entry.render();
        assert!(line.starts_with("INFO [derive] Derived account |"));
        assert!(line.contains("path=m/44'/60'/0'/0/0"));
        assert!(!line.contains("TREZOR"));
        assert!(line.contains("address=0x9858Ef...da94"));
    }

    #[test]
    fn test_render_without_fields() {
        let entry = LogEntry::new(LogLevel::Error, "cli", "Command failed");
        assert_eq!(entry.render(), "ERROR [cli] Command failed");
    }
}
