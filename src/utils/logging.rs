//! Logging Helpers with Sensitive Data Redaction
//!
//! Log output goes through `tracing`. Values attached to events are passed
//! through these helpers first:
//! - Addresses are partially redacted
//! - Signatures and signed payloads are reduced to their length
//!
//! Message and typed-data contents are never logged.

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is not set
pub const DEFAULT_LOG_DIRECTIVE: &str = "warn";

/// Install a stderr `tracing` subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { DEFAULT_LOG_DIRECTIVE };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Fully redact a sensitive value, keeping only its length
pub fn redact_value(value: &str) -> String {
    match value.len() {
        0 => "[EMPTY]".to_string(),
        1..=4 => "[REDACTED]".to_string(),
        len => format!("[REDACTED:{}chars]", len),
    }
}

/// Partially redact an address (first 8 chars for `0x` addresses, last 4)
pub fn redact_address(address: &str) -> String {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }

    let prefix_len = if trimmed.starts_with("0x") { 8 } else { 6 };
    let suffix_len = 4;
    if trimmed.len() <= prefix_len + suffix_len + 3 || !trimmed.is_ascii() {
        return redact_value(trimmed);
    }

    format!("{}...{}", &trimmed[..prefix_len], &trimmed[trimmed.len() - suffix_len..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_address() {
        let redacted = redact_address("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        assert_eq!(redacted, "0xf39Fd6...2266");
        assert_eq!(redact_address(""), "[EMPTY]");
        assert_eq!(redact_address("0xabc"), "[REDACTED:5chars]");
    }

    #[test]
    fn test_redact_value() {
        assert_eq!(redact_value(""), "[EMPTY]");
        assert_eq!(redact_value("abcd"), "[REDACTED]");
        assert_eq!(redact_value("0x1234567890"), "[REDACTED:12chars]");
    }
}
