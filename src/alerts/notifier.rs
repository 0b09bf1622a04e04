//! Notification handlers for alerts

use std::collections::HashMap;
use std::future::Future;
use std::io::Write;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};

/// Receives outage and recovery notifications from the alert loop
///
/// Both calls are awaited inline by the loop, one at a time. A returned error
/// is logged and otherwise ignored; the loop does not retry.
pub trait Notifier: Send + Sync {
    /// The target became (or stayed past the cooldown) unhealthy
    fn alert<'a>(&'a self, message: &'a str) -> BoxFuture<'a, Result<(), NotifyError>>;

    /// The target is healthy again after an alert
    fn recover(&self) -> BoxFuture<'_, Result<(), NotifyError>>;
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Writes alerts to stderr and recoveries to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct StdNotifier;

impl StdNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for StdNotifier {
    fn alert<'a>(&'a self, message: &'a str) -> BoxFuture<'a, Result<(), NotifyError>> {
        let result = writeln!(
            std::io::stderr().lock(),
            "[{}] Server is not OK!\n{}",
            timestamp(),
            message
        )
        .map_err(NotifyError::from);
        futures::future::ready(result).boxed()
    }

    fn recover(&self) -> BoxFuture<'_, Result<(), NotifyError>> {
        let result = writeln!(std::io::stdout().lock(), "[{}] Server recovered!", timestamp())
            .map_err(NotifyError::from);
        futures::future::ready(result).boxed()
    }
}

/// Reports through tracing
#[derive(Debug, Clone)]
pub struct LogNotifier {
    target: String,
}

impl LogNotifier {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

impl Notifier for LogNotifier {
    fn alert<'a>(&'a self, message: &'a str) -> BoxFuture<'a, Result<(), NotifyError>> {
        tracing::warn!(target_uri = %self.target, "Server is not OK: {}", message);
        futures::future::ready(Ok(())).boxed()
    }

    fn recover(&self) -> BoxFuture<'_, Result<(), NotifyError>> {
        tracing::info!(target_uri = %self.target, "Server recovered");
        futures::future::ready(Ok(())).boxed()
    }
}

/// Posts a JSON payload to an HTTP endpoint
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    target: String,
    headers: HashMap<String, String>,
    timeout: Duration,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            target: String::new(),
            headers: HashMap::new(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Name the monitored target in payloads
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Extra request headers
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn send(&self, event: &str, message: Option<&str>) -> Result<(), NotifyError> {
        let payload = serde_json::json!({
            "event": event,
            "target": self.target,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let mut request = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&payload);

        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| NotifyError::Webhook(format!("Failed to send webhook: {}", e)))?;

        if !response.status().is_success() {
            return Err(NotifyError::Webhook(format!(
                "Webhook returned status {}",
                response.status()
            )));
        }

        tracing::debug!(url = %self.url, event, "Webhook notification sent");

        Ok(())
    }
}

impl Notifier for WebhookNotifier {
    fn alert<'a>(&'a self, message: &'a str) -> BoxFuture<'a, Result<(), NotifyError>> {
        self.send("alert", Some(message)).boxed()
    }

    fn recover(&self) -> BoxFuture<'_, Result<(), NotifyError>> {
        self.send("recover", None).boxed()
    }
}

/// Notifier backed by a pair of async closures
pub struct FnNotifier<A, R> {
    alert: A,
    recover: R,
}

/// Wrap an alert closure and a recover closure as a [`Notifier`]
pub fn notifier_fn<A, AFut, R, RFut>(alert: A, recover: R) -> FnNotifier<A, R>
where
    A: Fn(String) -> AFut + Send + Sync,
    AFut: Future<Output = Result<(), NotifyError>> + Send + 'static,
    R: Fn() -> RFut + Send + Sync,
    RFut: Future<Output = Result<(), NotifyError>> + Send + 'static,
{
    FnNotifier { alert, recover }
}

impl<A, AFut, R, RFut> Notifier for FnNotifier<A, R>
where
    A: Fn(String) -> AFut + Send + Sync,
    AFut: Future<Output = Result<(), NotifyError>> + Send + 'static,
    R: Fn() -> RFut + Send + Sync,
    RFut: Future<Output = Result<(), NotifyError>> + Send + 'static,
{
    fn alert<'a>(&'a self, message: &'a str) -> BoxFuture<'a, Result<(), NotifyError>> {
        (self.alert)(message.to_string()).boxed()
    }

    fn recover(&self) -> BoxFuture<'_, Result<(), NotifyError>> {
        (self.recover)().boxed()
    }
}

/// Notifier errors
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Write error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Webhook error: {0}")]
    Webhook(String),

    #[error("Notification failed: {0}")]
    Callback(String),
}
