//! Configuration for the rollup watcher

use std::time::Duration;

use serde::{
    Deserialize,
    Serialize,
};
use url::Url;

use crate::error::{
    Result,
    WatcherError,
};

/// Interval between polls of the gateway route.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);
/// Quick retries attempted before a failure is published.
pub const DEFAULT_ERROR_RETRIES: usize = 3;
/// Delay between those retries.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
/// Upper bound on a single HTTP request to the gateway.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the rollup watcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Full URL of the gateway's rollup-info route
    pub endpoint: String,
    /// How often to poll once a poll cycle has settled
    pub poll_interval: Duration,
    /// Quick retries attempted within a cycle before publishing `Failed`
    pub error_retries: usize,
    /// Delay between quick retries
    pub retry_delay: Duration,
    /// Bound on a single HTTP request; a gateway that never answers counts
    /// as a failed attempt instead of stalling the cycle
    pub request_timeout: Duration,
}

impl WatcherConfig {
    /// Create a configuration polling `endpoint` with the defaults.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            error_retries: DEFAULT_ERROR_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the retry budget
    pub fn with_error_retries(mut self, retries: usize) -> Self {
        self.error_retries = retries;
        self
    }

    /// Set the delay between quick retries
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            return Err(WatcherError::ConfigError(
                "endpoint cannot be empty".to_string(),
            ));
        }
        let url = Url::parse(&self.endpoint)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(WatcherError::ConfigError(format!(
                "endpoint must be an http(s) URL, got scheme {:?}",
                url.scheme()
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(WatcherError::ConfigError(
                "poll interval must be positive".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(WatcherError::ConfigError(
                "request timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
