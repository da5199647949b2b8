//! Anti-automation screening — runs before field validation on every payload.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::AntiAutomationError;

/// Validates the honeypot field and the client timestamp on every payload.
///
/// A payload failing either check is rejected whole; no field data is
/// accepted from it.
#[derive(Debug, Clone)]
pub struct AntiAutomationGuard {
    window: chrono::Duration,
}

impl AntiAutomationGuard {
    /// Create a guard accepting client timestamps within `window` of server
    /// time in either direction.
    pub fn new(window: Duration) -> Self {
        Self {
            window: chrono::Duration::from_std(window)
                .unwrap_or_else(|_| chrono::Duration::minutes(5)),
        }
    }

    /// Screen a payload's honeypot value and client timestamp against the
    /// current server time.
    pub fn check(&self, honeypot: &str, client_timestamp_ms: i64) -> Result<(), AntiAutomationError> {
        self.check_at(honeypot, client_timestamp_ms, Utc::now())
    }

    /// Same as [`check`](Self::check) with an explicit `now`, for
    /// deterministic tests.
    pub fn check_at(
        &self,
        honeypot: &str,
        client_timestamp_ms: i64,
        now: DateTime<Utc>,
    ) -> Result<(), AntiAutomationError> {
        if !honeypot.is_empty() {
            debug!(len = honeypot.len(), "honeypot field carried a value");
            return Err(AntiAutomationError::HoneypotTripped);
        }

        let Some(client) = DateTime::<Utc>::from_timestamp_millis(client_timestamp_ms) else {
            debug!(client_timestamp_ms, "client timestamp not representable");
            return Err(AntiAutomationError::TimestampOutOfWindow);
        };
        let skew = now.signed_duration_since(client);
        if skew > self.window || skew < -self.window {
            debug!(skew_secs = skew.num_seconds(), "client timestamp outside freshness window");
            return Err(AntiAutomationError::TimestampOutOfWindow);
        }
        Ok(())
    }
}

impl Default for AntiAutomationGuard {
    fn default() -> Self {
        Self::new(Duration::from_secs(5 * 60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> AntiAutomationGuard {
        AntiAutomationGuard::default()
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_000).unwrap()
    }

    #[test]
    fn fresh_timestamp_and_empty_honeypot_pass() {
        assert!(guard().check_at("", now().timestamp_millis(), now()).is_ok());
    }

    #[test]
    fn any_honeypot_value_rejects() {
        let err = guard()
            .check_at("http://spam.example", now().timestamp_millis(), now())
            .unwrap_err();
        assert!(matches!(err, AntiAutomationError::HoneypotTripped));

        // Even whitespace counts as filled.
        let err = guard().check_at(" ", now().timestamp_millis(), now()).unwrap_err();
        assert!(matches!(err, AntiAutomationError::HoneypotTripped));
    }

    #[test]
    fn stale_timestamp_rejects() {
        let five_min_one_sec_ago = now().timestamp_millis() - (5 * 60 + 1) * 1000;
        let err = guard().check_at("", five_min_one_sec_ago, now()).unwrap_err();
        assert!(matches!(err, AntiAutomationError::TimestampOutOfWindow));
    }

    #[test]
    fn future_skewed_timestamp_rejects() {
        let five_min_one_sec_ahead = now().timestamp_millis() + (5 * 60 + 1) * 1000;
        let err = guard().check_at("", five_min_one_sec_ahead, now()).unwrap_err();
        assert!(matches!(err, AntiAutomationError::TimestampOutOfWindow));
    }

    #[test]
    fn window_edges_are_inclusive() {
        let at_past_edge = now().timestamp_millis() - 5 * 60 * 1000;
        let at_future_edge = now().timestamp_millis() + 5 * 60 * 1000;
        assert!(guard().check_at("", at_past_edge, now()).is_ok());
        assert!(guard().check_at("", at_future_edge, now()).is_ok());
    }

    #[test]
    fn unrepresentable_timestamp_rejects() {
        let err = guard().check_at("", i64::MAX, now()).unwrap_err();
        assert!(matches!(err, AntiAutomationError::TimestampOutOfWindow));
    }
}
