//! Alert debouncing
//!
//! Tracks whether an alert is open and when it was last sent, and decides per
//! check result whether the notifier should be called. Repeat alerts for one
//! outage are keyed on elapsed time since the last send, not on a failure
//! count, so a flapping target produces at most one alert per cooldown window
//! while a long outage keeps re-alerting once per window.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// An alert that has been sent and not yet recovered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAlert {
    /// When `alert()` was last invoked for this outage
    pub last_alert_at: Instant,
    /// Diagnostic carried by the last sent alert
    pub message: String,
}

/// What the alert loop should do with a check result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Invoke `alert(message)`
    Alert,
    /// Unhealthy inside the cooldown window
    Suppress,
    /// Invoke `recover()`
    Recover,
    /// Healthy and nothing open
    Idle,
}

/// Healthy/Alerting state machine
#[derive(Debug, Clone)]
pub struct DebounceState {
    alert_interval: Duration,
    open: Option<OpenAlert>,
}

impl DebounceState {
    pub fn new(alert_interval: Duration) -> Self {
        Self {
            alert_interval,
            open: None,
        }
    }

    pub fn is_alerting(&self) -> bool {
        self.open.is_some()
    }

    pub fn open_alert(&self) -> Option<&OpenAlert> {
        self.open.as_ref()
    }

    /// Record an unhealthy check observed at `now`.
    pub fn on_unhealthy(&mut self, message: &str, now: Instant) -> Action {
        if let Some(open) = self.open.as_mut() {
            // A pivot past the end of the clock is never reached.
            match open.last_alert_at.checked_add(self.alert_interval) {
                Some(pivot) if now >= pivot => {}
                _ => return Action::Suppress,
            }
            open.last_alert_at = now;
            open.message = message.to_string();
            return Action::Alert;
        }

        self.open = Some(OpenAlert {
            last_alert_at: now,
            message: message.to_string(),
        });
        Action::Alert
    }

    /// Record a healthy check.
    pub fn on_healthy(&mut self) -> Action {
        match self.open.take() {
            Some(_) => Action::Recover,
            None => Action::Idle,
        }
    }
}

/// Point-in-time view of an alerter, published after every check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertStatus {
    /// Whether an alert is currently open
    pub alerting: bool,
    /// Last check timestamp
    pub last_checked: Option<DateTime<Utc>>,
    /// Last time an alert was sent
    pub last_alerted: Option<DateTime<Utc>>,
    /// Unhealthy checks in a row
    pub consecutive_failures: u32,
    /// Diagnostic from the most recent unhealthy check
    pub last_error: Option<String>,
    /// Checks run since start
    pub checks: u64,
    pub alerts_sent: u64,
    pub recoveries_sent: u64,
}

impl AlertStatus {
    pub(crate) fn record(&mut self, error: Option<&str>, action: Action, alerting: bool) {
        let now = Utc::now();
        self.checks += 1;
        self.last_checked = Some(now);
        self.alerting = alerting;

        match error {
            Some(message) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                self.last_error = Some(message.to_string());
            }
            None => {
                self.consecutive_failures = 0;
                self.last_error = None;
            }
        }

        match action {
            Action::Alert => {
                self.alerts_sent += 1;
                self.last_alerted = Some(now);
            }
            Action::Recover => self.recoveries_sent += 1,
            Action::Suppress | Action::Idle => {}
        }
    }
}
