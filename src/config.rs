//! Configuration types.

use std::time::Duration;

/// Intake flow configuration.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// Accepted skew between the client timestamp and server time, in either
    /// direction.
    pub timestamp_window: Duration,
    /// How long a created quote remains valid.
    pub quote_validity_days: i64,
    /// Upper bound on accepted email length.
    pub max_email_length: usize,
    /// Upper bound on free-text fields (descriptions, notes).
    pub max_text_length: usize,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            timestamp_window: Duration::from_secs(5 * 60), // 5 minutes
            quote_validity_days: 30,
            max_email_length: 254,
            max_text_length: 2000,
        }
    }
}
