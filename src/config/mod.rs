//! Configuration for the alerter
//!
//! Interval settings consumed by the alert loop, the notifier registry and the
//! on-disk config file read by the `alerter` binary.

pub mod file;
pub mod intervals;
pub mod notifier;

use std::path::PathBuf;

pub use file::{CheckerSettings, Config, DEFAULT_CONFIG_NAME};
pub use intervals::{
    AlerterConfig, IntervalSettings, DEFAULT_ALERT_INTERVAL_SECS, DEFAULT_CHECK_INTERVAL_SECS,
    MAX_CHECK_INTERVAL_SECS,
};
pub use notifier::NotifierConfig;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("check_interval should be larger than 0")]
    InvalidCheckInterval,

    #[error("check_interval cannot exceed {0} seconds")]
    CheckIntervalTooLarge(i64),

    #[error("alert_interval cannot be negative")]
    NegativeAlertInterval,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to read config file [{}]: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file [{}]: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("failed to write config file [{}]: {reason}", .path.display())]
    Write { path: PathBuf, reason: String },
}
