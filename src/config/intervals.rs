//! Check and alert interval settings

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Default seconds between health checks
pub const DEFAULT_CHECK_INTERVAL_SECS: i64 = 10;
/// Default cooldown, in seconds, between repeated alerts for one outage
pub const DEFAULT_ALERT_INTERVAL_SECS: i64 = 60;
/// Longest accepted check interval (one year)
pub const MAX_CHECK_INTERVAL_SECS: i64 = 365 * 24 * 60 * 60;

/// Resolved interval settings for an [`Alerter`](crate::alerts::Alerter).
///
/// `check_interval` is the cadence of the health loop and must be non-zero.
/// `alert_interval` is the cooldown window: while an alert stays open, a new
/// notification is sent only once this much time has passed since the last one.
/// A zero cooldown re-alerts on every unhealthy check, and a cooldown too large
/// to add to the clock never re-alerts within one outage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlerterConfig {
    pub check_interval: Duration,
    pub alert_interval: Duration,
}

impl AlerterConfig {
    pub fn new(check_interval: Duration, alert_interval: Duration) -> Self {
        Self {
            check_interval,
            alert_interval,
        }
    }

    /// Set check interval
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Set alert cooldown
    pub fn with_alert_interval(mut self, interval: Duration) -> Self {
        self.alert_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.check_interval.is_zero() {
            return Err(ConfigError::InvalidCheckInterval);
        }
        if self.check_interval > Duration::from_secs(MAX_CHECK_INTERVAL_SECS as u64) {
            return Err(ConfigError::CheckIntervalTooLarge(MAX_CHECK_INTERVAL_SECS));
        }
        Ok(())
    }
}

impl Default for AlerterConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS as u64),
            alert_interval: Duration::from_secs(DEFAULT_ALERT_INTERVAL_SECS as u64),
        }
    }
}

/// Interval settings as written in a config file, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalSettings {
    pub check_interval: i64,
    pub alert_interval: i64,
}

impl IntervalSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.check_interval <= 0 {
            return Err(ConfigError::InvalidCheckInterval);
        }
        if self.check_interval > MAX_CHECK_INTERVAL_SECS {
            return Err(ConfigError::CheckIntervalTooLarge(MAX_CHECK_INTERVAL_SECS));
        }
        if self.alert_interval < 0 {
            return Err(ConfigError::NegativeAlertInterval);
        }
        Ok(())
    }

    /// Validate and convert to the durations the alert loop runs on.
    pub fn resolve(&self) -> Result<AlerterConfig, ConfigError> {
        self.validate()?;
        Ok(AlerterConfig::new(
            Duration::from_secs(self.check_interval as u64),
            Duration::from_secs(self.alert_interval as u64),
        ))
    }
}

impl Default for IntervalSettings {
    fn default() -> Self {
        Self {
            check_interval: DEFAULT_CHECK_INTERVAL_SECS,
            alert_interval: DEFAULT_ALERT_INTERVAL_SECS,
        }
    }
}

impl TryFrom<IntervalSettings> for AlerterConfig {
    type Error = ConfigError;

    fn try_from(settings: IntervalSettings) -> Result<Self, Self::Error> {
        settings.resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_defaults() {
        let config = AlerterConfig::default();
        assert_eq!(config.check_interval, Duration::from_secs(10));
        assert_eq!(config.alert_interval, Duration::from_secs(60));
        assert_ok!(config.validate());

        let resolved = IntervalSettings::default().resolve().unwrap();
        assert_eq!(resolved, config);
    }

    #[test]
    fn test_zero_check_interval_rejected() {
        let config = AlerterConfig::default().with_check_interval(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCheckInterval)
        ));
    }

    #[test]
    fn test_zero_alert_interval_allowed() {
        let config = AlerterConfig::default().with_alert_interval(Duration::ZERO);
        assert_ok!(config.validate());

        let settings = IntervalSettings {
            check_interval: 1,
            alert_interval: 0,
        };
        assert_eq!(settings.resolve().unwrap().alert_interval, Duration::ZERO);
    }

    #[test]
    fn test_settings_validation() {
        let negative_check = IntervalSettings {
            check_interval: -1,
            alert_interval: 5,
        };
        assert!(matches!(
            negative_check.validate(),
            Err(ConfigError::InvalidCheckInterval)
        ));

        let zero_check = IntervalSettings {
            check_interval: 0,
            alert_interval: 5,
        };
        assert_err!(zero_check.resolve());

        let negative_alert = IntervalSettings {
            check_interval: 1,
            alert_interval: -5,
        };
        assert!(matches!(
            AlerterConfig::try_from(negative_alert),
            Err(ConfigError::NegativeAlertInterval)
        ));
    }

    #[test]
    fn test_oversized_check_interval_rejected() {
        let config = AlerterConfig::default().with_check_interval(Duration::MAX);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CheckIntervalTooLarge(_))
        ));

        let settings = IntervalSettings {
            check_interval: i64::MAX,
            alert_interval: 5,
        };
        assert!(matches!(
            settings.resolve(),
            Err(ConfigError::CheckIntervalTooLarge(_))
        ));

        let at_limit = IntervalSettings {
            check_interval: MAX_CHECK_INTERVAL_SECS,
            alert_interval: 5,
        };
        assert_ok!(at_limit.resolve());
    }

    #[test]
    fn test_huge_alert_interval_allowed() {
        let settings = IntervalSettings {
            check_interval: 1,
            alert_interval: i64::MAX,
        };
        let config = settings.resolve().unwrap();
        assert_eq!(config.alert_interval, Duration::from_secs(i64::MAX as u64));
        assert_ok!(config.validate());
    }

    #[test]
    fn test_settings_resolve_to_seconds() {
        let settings = IntervalSettings {
            check_interval: 3,
            alert_interval: 45,
        };
        let config = settings.resolve().unwrap();
        assert_eq!(config.check_interval, Duration::from_secs(3));
        assert_eq!(config.alert_interval, Duration::from_secs(45));
    }
}
