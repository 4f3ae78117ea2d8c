//! Sequencer configuration with sensible defaults.
//!
//! [`SequencerConfig`] controls the re-check interval, how the engine
//! advances after a successful fire, and the registration/diagnostics
//! policies. The defaults match what most callers want: synchronous
//! advancement, full validation, an 8 ms check interval.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the engine approaches the next item after a successful fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceMode {
    /// Check the next head in the same call stack, with no yield back to
    /// the runtime. A burst of already-satisfied conditions drains without
    /// any polling delay between items.
    #[default]
    Synchronous,
    /// Schedule the next head's first check on the timer instead, trading
    /// latency for a guaranteed yield between items.
    Deferred,
}

impl std::fmt::Display for AdvanceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Synchronous => write!(f, "synchronous"),
            Self::Deferred => write!(f, "deferred"),
        }
    }
}

/// Configuration for a [`Sequencer`](crate::Sequencer).
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides. Every field can also be changed after construction
/// through the sequencer's fluent setters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Minimum milliseconds between re-checks of a not-yet-ready
    /// condition. Defaults to 8, two checks per standard 60 fps frame.
    pub check_interval_ms: u64,
    /// Advancement mode after a successful fire.
    pub advance: AdvanceMode,
    /// Whether registration-time validation is performed. When disabled, a
    /// boolean `false` condition is admitted and simply never becomes
    /// ready, blocking the queue until cleared.
    pub validate_registrations: bool,
    /// Whether rejected-input diagnostics are emitted through `tracing`.
    pub log_errors: bool,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: 8,
            advance: AdvanceMode::Synchronous,
            validate_registrations: true,
            log_errors: true,
        }
    }
}

impl SequencerConfig {
    /// The check interval as a [`Duration`].
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = SequencerConfig::default();
        assert_eq!(config.check_interval_ms, 8);
        assert_eq!(config.advance, AdvanceMode::Synchronous);
        assert!(config.validate_registrations);
        assert!(config.log_errors);
    }

    #[test]
    fn check_interval_converts_to_duration() {
        let config = SequencerConfig {
            check_interval_ms: 250,
            ..Default::default()
        };
        assert_eq!(config.check_interval(), Duration::from_millis(250));
    }

    #[test]
    fn empty_json_yields_defaults() {
        let config: SequencerConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(config, SequencerConfig::default());
    }

    #[test]
    fn partial_json_overrides_single_field() {
        let config: SequencerConfig =
            serde_json::from_str(r#"{"advance": "deferred"}"#).expect("parse");
        assert_eq!(config.advance, AdvanceMode::Deferred);
        assert_eq!(config.check_interval_ms, 8);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = SequencerConfig {
            check_interval_ms: 40,
            advance: AdvanceMode::Deferred,
            validate_registrations: false,
            log_errors: false,
        };
        let json = serde_json::to_string(&config).expect("serialize");
        let restored: SequencerConfig = serde_json::from_str(&json).expect("parse");
        assert_eq!(restored, config);
    }
}
