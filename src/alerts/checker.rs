//! Health probes
//!
//! A [`Checker`] answers one question per tick: is the target healthy? An
//! `Err` is the unhealthy signal and carries the diagnostic that ends up in the
//! alert message; it is never treated as a fault of the alert loop.

use std::future::Future;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};

/// Pluggable health probe
pub trait Checker: Send + Sync {
    /// Probe `target`. `Ok` means healthy.
    ///
    /// Implementations bound their own running time; the alert loop waits for
    /// the returned future without a timeout.
    fn check<'a>(&'a self, target: &'a str) -> BoxFuture<'a, Result<(), CheckError>>;
}

/// HTTP reachability probe
///
/// Issues a GET against the target and treats anything but a 2xx response as
/// unhealthy. Targets given as `host:port` are probed over plain HTTP.
#[derive(Debug, Clone)]
pub struct HttpChecker {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpChecker {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Create a checker with the default timeout
    pub fn new() -> Self {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }

    /// Create a checker with a per-request timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn probe(&self, target: &str) -> Result<(), CheckError> {
        let url = normalize_target(target);

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CheckError::Timeout(self.timeout)
                } else {
                    CheckError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url = %url, status = %status, "Health probe returned non-2xx");
            return Err(CheckError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        Ok(())
    }
}

impl Default for HttpChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl Checker for HttpChecker {
    fn check<'a>(&'a self, target: &'a str) -> BoxFuture<'a, Result<(), CheckError>> {
        self.probe(target).boxed()
    }
}

/// Prefix bare `host:port` targets with `http://`
fn normalize_target(target: &str) -> String {
    let target = target.trim();
    if target.contains("://") {
        target.to_string()
    } else {
        format!("http://{}", target)
    }
}

/// Checker backed by an async closure
pub struct FnChecker<F> {
    f: F,
}

/// Wrap an async closure as a [`Checker`]
pub fn checker_fn<F, Fut>(f: F) -> FnChecker<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), CheckError>> + Send + 'static,
{
    FnChecker { f }
}

impl<F, Fut> Checker for FnChecker<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), CheckError>> + Send + 'static,
{
    fn check<'a>(&'a self, target: &'a str) -> BoxFuture<'a, Result<(), CheckError>> {
        (self.f)(target.to_string()).boxed()
    }
}

/// Reasons a target is considered unhealthy
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    #[error("Server responded with status {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Unhealthy(String),
}
