//! Health-check alerting
//!
//! Runs a background loop that probes one target on a fixed cadence and
//! notifies on outage and recovery, with a cooldown between repeated alerts
//! for the same outage.
//!
//! ```text
//! Alerter
//!   └── background loop (one per Alerter)
//!       ├── Checker::check(target)      every check_interval
//!       ├── DebounceState               Healthy <-> Alerting
//!       └── Notifier::alert / recover   on transitions
//! ```

pub mod alerter;
pub mod checker;
pub mod debounce;
pub mod notifier;

pub use alerter::{Alerter, AlerterBuilder, AlerterError};
pub use checker::{checker_fn, CheckError, Checker, FnChecker, HttpChecker};
pub use debounce::{Action, AlertStatus, DebounceState, OpenAlert};
pub use notifier::{
    notifier_fn, FnNotifier, LogNotifier, Notifier, NotifyError, StdNotifier, WebhookNotifier,
};
