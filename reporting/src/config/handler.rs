//! Result handler configuration.
//!
//! Periods that used to be baked into the handler live here and are passed
//! at construction. Values can be loaded from environment variables:
//!
//! - `RESULTS_NOTIFICATION_PERIOD_MS`: status cadence (default: 5000)
//! - `RESULTS_POLL_INTERVAL_MS`: consumer loop receive timeout (default: 100)
//! - `RESULTS_RESAMPLE_PERIOD_SECS`: overrides the policy resample period

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use validator::Validate;

/// Default status/notification cadence in milliseconds.
pub const DEFAULT_NOTIFICATION_PERIOD_MS: u64 = 5_000;

/// Default consumer loop receive timeout in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Largest accepted resample override, in seconds (about 1000 years).
pub const MAX_RESAMPLE_PERIOD_SECS: u64 = 31_536_000_000;

const ENV_NOTIFICATION_PERIOD: &str = "RESULTS_NOTIFICATION_PERIOD_MS";
const ENV_POLL_INTERVAL: &str = "RESULTS_POLL_INTERVAL_MS";
const ENV_RESAMPLE_PERIOD: &str = "RESULTS_RESAMPLE_PERIOD_SECS";

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("Invalid value {value:?} for {key}: {source}")]
    Parse {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
        /// Parse failure.
        #[source]
        source: std::num::ParseIntError,
    },

    /// Validation failed with details.
    #[error("Validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

/// Timing configuration of a result handler.
///
/// # Example
///
/// ```
/// use reporting::config::HandlerConfig;
/// use std::time::Duration;
///
/// let config = HandlerConfig::default().with_notification_period_ms(250);
/// assert!(config.validate_config().is_ok());
/// assert_eq!(config.notification_period(), Duration::from_millis(250));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct HandlerConfig {
    /// How often the consumer loop reports status, in milliseconds.
    #[validate(range(min = 1, message = "Notification period must be positive"))]
    #[serde(default = "default_notification_period_ms")]
    pub notification_period_ms: u64,

    /// How long the consumer loop waits for a message before re-checking
    /// its exit signal, in milliseconds.
    #[validate(range(min = 1, message = "Poll interval must be positive"))]
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Overrides the resample period derived from the run, in seconds.
    #[validate(range(
        min = 1,
        max = MAX_RESAMPLE_PERIOD_SECS,
        message = "Resample period must be between 1 second and 1000 years"
    ))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resample_period_secs: Option<u64>,
}

fn default_notification_period_ms() -> u64 {
    DEFAULT_NOTIFICATION_PERIOD_MS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl HandlerConfig {
    /// Creates a configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but is not a valid integer, or
    /// if the resulting configuration fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates a configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is not a valid integer or if the
    /// resulting configuration fails validation.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse = |key: &'static str| -> Result<Option<u64>, ConfigError> {
            lookup(key)
                .map(|value| {
                    value
                        .trim()
                        .parse::<u64>()
                        .map_err(|source| ConfigError::Parse { key, value, source })
                })
                .transpose()
        };

        let config = Self {
            notification_period_ms: parse(ENV_NOTIFICATION_PERIOD)?
                .unwrap_or(DEFAULT_NOTIFICATION_PERIOD_MS),
            poll_interval_ms: parse(ENV_POLL_INTERVAL)?.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            resample_period_secs: parse(ENV_RESAMPLE_PERIOD)?,
        };
        config.validate_config()?;
        Ok(config)
    }

    /// Sets the notification period.
    #[must_use]
    pub fn with_notification_period_ms(mut self, millis: u64) -> Self {
        self.notification_period_ms = millis;
        self
    }

    /// Sets the poll interval.
    #[must_use]
    pub fn with_poll_interval_ms(mut self, millis: u64) -> Self {
        self.poll_interval_ms = millis;
        self
    }

    /// Overrides the resample period.
    #[must_use]
    pub fn with_resample_period_secs(mut self, secs: u64) -> Self {
        self.resample_period_secs = Some(secs);
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any period is zero or the resample override is
    /// larger than `MAX_RESAMPLE_PERIOD_SECS`.
    pub fn validate_config(&self) -> Result<(), ConfigError> {
        self.validate()?;
        Ok(())
    }

    /// Status/notification cadence.
    #[must_use]
    pub fn notification_period(&self) -> Duration {
        Duration::from_millis(self.notification_period_ms)
    }

    /// Consumer loop receive timeout.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Resample override, if configured.
    #[must_use]
    pub fn resample_period_override(&self) -> Option<chrono::Duration> {
        self.resample_period_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(chrono::Duration::try_seconds)
    }
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            notification_period_ms: DEFAULT_NOTIFICATION_PERIOD_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            resample_period_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = HandlerConfig::default();
        assert_eq!(config.notification_period(), Duration::from_secs(5));
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert!(config.resample_period_override().is_none());
    }

    #[test]
    fn test_from_lookup_empty_uses_defaults() {
        let config = HandlerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, HandlerConfig::default());
    }

    #[test]
    fn test_from_lookup_reads_values() {
        let config = HandlerConfig::from_lookup(lookup(&[
            ("RESULTS_NOTIFICATION_PERIOD_MS", "1000"),
            ("RESULTS_POLL_INTERVAL_MS", " 20 "),
            ("RESULTS_RESAMPLE_PERIOD_SECS", "60"),
        ]))
        .unwrap();

        assert_eq!(config.notification_period_ms, 1000);
        assert_eq!(config.poll_interval_ms, 20);
        assert_eq!(
            config.resample_period_override(),
            Some(chrono::Duration::seconds(60))
        );
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = HandlerConfig::from_lookup(lookup(&[("RESULTS_POLL_INTERVAL_MS", "fast")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { key: "RESULTS_POLL_INTERVAL_MS", .. }));
    }

    #[test]
    fn test_zero_period_fails_validation() {
        let config = HandlerConfig::default().with_notification_period_ms(0);
        assert!(matches!(
            config.validate_config(),
            Err(ConfigError::ValidationError(_))
        ));

        let err = HandlerConfig::from_lookup(lookup(&[("RESULTS_RESAMPLE_PERIOD_SECS", "0")]));
        assert!(err.is_err());
    }

    #[test]
    fn test_oversized_resample_period_fails_validation() {
        let err = HandlerConfig::from_lookup(lookup(&[(
            "RESULTS_RESAMPLE_PERIOD_SECS",
            "18446744073709551615",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        let config = HandlerConfig::default().with_resample_period_secs(u64::MAX / 2);
        assert!(config.validate_config().is_err());

        let config = HandlerConfig::default().with_resample_period_secs(MAX_RESAMPLE_PERIOD_SECS);
        assert!(config.validate_config().is_ok());
        assert_eq!(
            config.resample_period_override(),
            Some(chrono::Duration::seconds(31_536_000_000))
        );
    }

    #[test]
    fn test_serde_defaults() {
        let config: HandlerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, HandlerConfig::default());

        let config: HandlerConfig =
            serde_json::from_str(r#"{"notification_period_ms": 250}"#).unwrap();
        assert_eq!(config.notification_period_ms, 250);
    }
}
