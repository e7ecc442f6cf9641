//! Redaction of patient identifiers in log output.
//!
//! Row-level values (patient and encounter ids) are only written to logs when
//! the binary explicitly enables it with `--log-data`.

use std::sync::atomic::{AtomicBool, Ordering};

static LOG_DATA_ENABLED: AtomicBool = AtomicBool::new(false);

/// Placeholder used when row-level logging is disabled.
pub const REDACTED_VALUE: &str = "[REDACTED]";

/// Allow or forbid row-level values in log output.
pub fn set_log_data_enabled(enabled: bool) {
    LOG_DATA_ENABLED.store(enabled, Ordering::Release);
}

/// Returns true if row-level logging is explicitly enabled.
pub fn log_data_enabled() -> bool {
    LOG_DATA_ENABLED.load(Ordering::Relaxed)
}

/// Returns the input value when identifier logging is enabled, otherwise a redacted token.
pub fn redact_value(value: &str) -> &str {
    if log_data_enabled() {
        value
    } else {
        REDACTED_VALUE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacts_by_default() {
        assert_eq!(redact_value("10001"), REDACTED_VALUE);
    }
}
