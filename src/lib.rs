//! Alerter: periodic health checks with debounced notifications
//!
//! Probes a target on a fixed interval and notifies an operator when it goes
//! down and when it comes back. While an outage lasts, repeat alerts are sent
//! at most once per cooldown window.
//!
//! # Features
//!
//! - **Pluggable probes**: HTTP reachability by default, or any async closure
//! - **Pluggable notifiers**: stdout/stderr, tracing, webhook, or closures
//! - **Cooldown**: one alert per `alert_interval` while the target stays down
//! - **Safe lifecycle**: `start` returns once the loop is live, `stop` once it
//!   has exited; both are safe under concurrent calls
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use alerter::alerts::{Alerter, NotifyError};
//! use alerter::config::AlerterConfig;
//!
//! # async fn example() -> Result<(), alerter::alerts::AlerterError> {
//! let config = AlerterConfig::new(Duration::from_secs(10), Duration::from_secs(60));
//! let alerter = Alerter::builder(config)
//!     .target("http://127.0.0.1:8080/health")
//!     .callbacks(
//!         |message: String| async move {
//!             eprintln!("down: {}", message);
//!             Ok::<(), NotifyError>(())
//!         },
//!         || async { Ok::<(), NotifyError>(()) },
//!     )
//!     .build();
//!
//! alerter.start().await?;
//! // ...
//! alerter.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod config;

// Re-export commonly used types
pub use alerts::{Alerter, AlerterError, CheckError, Checker, Notifier, NotifyError};
pub use config::{AlerterConfig, Config, ConfigError};
