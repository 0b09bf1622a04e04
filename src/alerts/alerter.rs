//! Background health-check loop and its lifecycle

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::checker::{Checker, HttpChecker};
use super::debounce::{Action, AlertStatus, DebounceState};
use super::notifier::{notifier_fn, Notifier, NotifyError, StdNotifier};
use crate::config::{AlerterConfig, ConfigError};

/// Periodically checks one target and notifies on outages and recoveries
///
/// At most one background loop runs per `Alerter`. [`start`](Self::start)
/// returns once the loop is waiting for its first tick, and
/// [`stop`](Self::stop) returns once the loop has exited, so a checker's
/// resources can be released right after `stop` completes.
pub struct Alerter {
    config: AlerterConfig,
    target: String,
    checker: Arc<dyn Checker>,
    notifier: Arc<dyn Notifier>,
    /// Cleared by the loop task itself when it ends
    running: Arc<AtomicBool>,
    /// Active loop, if any. Start and stop serialize on this lock.
    worker: Mutex<Option<Worker>>,
    status: Arc<watch::Sender<AlertStatus>>,
}

struct Worker {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
    /// Closed when the loop task exits; `true` if it shut down cleanly
    exited: watch::Receiver<bool>,
}

impl Alerter {
    /// Create an alerter for `target` with the default HTTP checker and
    /// stdout/stderr notifier. Use [`builder`](Self::builder) to plug in others.
    pub fn new(config: AlerterConfig, target: impl Into<String>) -> Self {
        Self::builder(config).target(target).build()
    }

    pub fn builder(config: AlerterConfig) -> AlerterBuilder {
        AlerterBuilder {
            config,
            target: String::new(),
            checker: None,
            notifier: None,
        }
    }

    pub fn config(&self) -> &AlerterConfig {
        &self.config
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Check if the loop is running. Turns false as soon as the loop task
    /// ends, whether through [`stop`](Self::stop) or a panic.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Latest status snapshot
    pub fn status(&self) -> AlertStatus {
        self.status.borrow().clone()
    }

    /// Watch status snapshots as the loop publishes them
    pub fn subscribe(&self) -> watch::Receiver<AlertStatus> {
        self.status.subscribe()
    }

    /// Start the background loop.
    ///
    /// Fails with [`AlerterError::AlreadyRunning`] if a loop is active, or
    /// [`AlerterError::Config`] if the intervals or target are invalid, in
    /// which case no task is spawned. On success the loop has begun waiting
    /// for its first tick.
    pub async fn start(&self) -> Result<(), AlerterError> {
        let mut worker = self.worker.lock().await;

        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AlerterError::AlreadyRunning);
        }

        // Left behind by a loop that died without `stop`
        if let Some(stale) = worker.take() {
            if let Err(e) = stale.handle.await {
                tracing::error!(target_uri = %self.target, error = %e, "Alert loop panicked");
            }
        }

        if let Err(e) = self.validate() {
            self.running.store(false, Ordering::SeqCst);
            return Err(e.into());
        }

        self.status.send_replace(AlertStatus::default());

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (ready_tx, ready_rx) = oneshot::channel();
        let (exit_tx, exit_rx) = watch::channel(false);

        let task = AlertLoop {
            config: self.config,
            target: self.target.clone(),
            checker: Arc::clone(&self.checker),
            notifier: Arc::clone(&self.notifier),
            status: Arc::clone(&self.status),
        };
        let exit = LoopExit {
            running: Arc::clone(&self.running),
            exited: exit_tx,
        };
        let handle = tokio::spawn(task.run(shutdown_rx, ready_tx, exit));

        if ready_rx.await.is_err() {
            if let Err(e) = handle.await {
                tracing::error!(target_uri = %self.target, error = %e, "Alert loop failed to start");
            }
            self.running.store(false, Ordering::SeqCst);
            return Err(AlerterError::StartAborted);
        }

        *worker = Some(Worker {
            shutdown_tx,
            handle,
            exited: exit_rx,
        });

        tracing::info!(
            target_uri = %self.target,
            check_interval = ?self.config.check_interval,
            alert_interval = ?self.config.alert_interval,
            "Alerter started"
        );

        Ok(())
    }

    /// Start the loop and wait until it is stopped.
    ///
    /// Returns [`AlerterError::LoopFailed`] if the loop task dies instead of
    /// being stopped.
    pub async fn run(&self) -> Result<(), AlerterError> {
        self.start().await?;

        let exited = {
            let worker = self.worker.lock().await;
            worker.as_ref().map(|w| w.exited.clone())
        };
        let Some(mut exited) = exited else {
            return Ok(());
        };

        // The sender lives in the loop task; `changed` errors once it is gone.
        while exited.changed().await.is_ok() {}
        if *exited.borrow() {
            return Ok(());
        }

        // Reap the dead loop. `start` sets the flag under this lock, so while
        // it is clear the slot cannot hold a newer loop.
        let mut worker = self.worker.lock().await;
        if !self.is_running() {
            if let Some(dead) = worker.take() {
                if let Err(e) = dead.handle.await {
                    tracing::error!(target_uri = %self.target, error = %e, "Alert loop panicked");
                }
            }
        }

        Err(AlerterError::LoopFailed)
    }

    /// Stop the loop and wait for it to exit.
    ///
    /// Safe to call when never started or already stopped. If the loop is in
    /// the middle of a check or notification, this waits for that call to
    /// return.
    pub async fn stop(&self) -> Result<(), AlerterError> {
        let mut worker = self.worker.lock().await;

        let Some(w) = worker.take() else {
            tracing::debug!(target_uri = %self.target, "Alerter not running");
            return Ok(());
        };

        let _ = w.shutdown_tx.send(true);
        if let Err(e) = w.handle.await {
            tracing::error!(target_uri = %self.target, error = %e, "Alert loop panicked");
        }
        self.running.store(false, Ordering::SeqCst);

        tracing::info!(target_uri = %self.target, "Alerter stopped");
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.config.validate()?;
        if self.target.trim().is_empty() {
            return Err(ConfigError::MissingField("target"));
        }
        Ok(())
    }
}

/// Builds an [`Alerter`]. Everything is fixed once `build` is called.
pub struct AlerterBuilder {
    config: AlerterConfig,
    target: String,
    checker: Option<Arc<dyn Checker>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl AlerterBuilder {
    /// Set the endpoint to probe
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn checker(self, checker: impl Checker + 'static) -> Self {
        self.shared_checker(Arc::new(checker))
    }

    pub fn shared_checker(mut self, checker: Arc<dyn Checker>) -> Self {
        self.checker = Some(checker);
        self
    }

    pub fn notifier(self, notifier: impl Notifier + 'static) -> Self {
        self.shared_notifier(Arc::new(notifier))
    }

    pub fn shared_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Use a pair of async closures as the notifier
    pub fn callbacks<A, AFut, R, RFut>(self, alert: A, recover: R) -> Self
    where
        A: Fn(String) -> AFut + Send + Sync + 'static,
        AFut: std::future::Future<Output = Result<(), NotifyError>> + Send + 'static,
        R: Fn() -> RFut + Send + Sync + 'static,
        RFut: std::future::Future<Output = Result<(), NotifyError>> + Send + 'static,
    {
        self.notifier(notifier_fn(alert, recover))
    }

    pub fn build(self) -> Alerter {
        let (status, _) = watch::channel(AlertStatus::default());
        Alerter {
            config: self.config,
            target: self.target,
            checker: self
                .checker
                .unwrap_or_else(|| Arc::new(HttpChecker::new())),
            notifier: self.notifier.unwrap_or_else(|| Arc::new(StdNotifier::new())),
            running: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
            status: Arc::new(status),
        }
    }
}

/// Owned by the loop task. Dropping it clears the running flag, then closes
/// the exit channel, so waiters never observe a stale `is_running`.
struct LoopExit {
    running: Arc<AtomicBool>,
    exited: watch::Sender<bool>,
}

impl LoopExit {
    fn clean(&self) {
        self.exited.send_replace(true);
    }
}

impl Drop for LoopExit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// State moved into the loop task
struct AlertLoop {
    config: AlerterConfig,
    target: String,
    checker: Arc<dyn Checker>,
    notifier: Arc<dyn Notifier>,
    status: Arc<watch::Sender<AlertStatus>>,
}

impl AlertLoop {
    async fn run(
        self,
        mut shutdown: watch::Receiver<bool>,
        ready: oneshot::Sender<()>,
        exit: LoopExit,
    ) {
        let mut state = DebounceState::new(self.config.alert_interval);
        let mut ticker = interval_at(
            Instant::now() + self.config.check_interval,
            self.config.check_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::debug!(target_uri = %self.target, "Alert loop starting");
        let mut ready = Some(ready);

        loop {
            if let Some(ready) = ready.take() {
                let _ = ready.send(());
            }

            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    tracing::debug!(target_uri = %self.target, "Alert loop shutting down");
                    exit.clean();
                    break;
                }
                _ = ticker.tick() => {
                    self.tick(&mut state).await;
                }
            }
        }
    }

    /// Run one check and act on the result
    async fn tick(&self, state: &mut DebounceState) {
        let result = self.checker.check(&self.target).await;

        let (action, error) = match &result {
            Ok(()) => (state.on_healthy(), None),
            Err(e) => {
                let message = e.to_string();
                (state.on_unhealthy(&message, Instant::now()), Some(message))
            }
        };

        self.status.send_modify(|status| {
            status.record(error.as_deref(), action, state.is_alerting())
        });

        match action {
            Action::Alert => {
                let message = error.as_deref().unwrap_or_default();
                tracing::warn!(
                    target_uri = %self.target,
                    error = message,
                    "Target unhealthy, sending alert"
                );
                if let Err(e) = self.notifier.alert(message).await {
                    tracing::error!(target_uri = %self.target, error = %e, "Failed to send alert");
                }
            }
            Action::Recover => {
                tracing::info!(target_uri = %self.target, "Target recovered");
                if let Err(e) = self.notifier.recover().await {
                    tracing::error!(target_uri = %self.target, error = %e, "Failed to send recovery");
                }
            }
            Action::Suppress => {
                tracing::debug!(
                    target_uri = %self.target,
                    error = error.as_deref().unwrap_or_default(),
                    "Target still unhealthy, alert suppressed"
                );
            }
            Action::Idle => {
                tracing::trace!(target_uri = %self.target, "Target healthy");
            }
        }
    }
}

/// Errors returned by [`Alerter`] lifecycle calls
#[derive(Debug, thiserror::Error)]
pub enum AlerterError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Alerter is already running")]
    AlreadyRunning,

    #[error("Alert loop exited before it started")]
    StartAborted,

    #[error("Alert loop exited unexpectedly")]
    LoopFailed,
}
