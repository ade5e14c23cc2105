//! The polling loop and its observable state.

use chrono::{
    DateTime,
    Utc,
};
use reqwest::Client;
use rollup_gateway::{
    api::RollupInfoResponse,
    rollup::RollupInfo,
};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::sleep,
};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{
    config::WatcherConfig,
    error::{
        Result,
        WatcherError,
    },
};

/// Externally observable state of the poll loop.
#[derive(Debug, Clone, PartialEq)]
pub enum WatcherState {
    /// Initial state: no poll has completed yet.
    Loading,
    /// The most recent poll cycle succeeded.
    Ready {
        info: RollupInfo,
        updated_at: DateTime<Utc>,
    },
    /// The most recent poll cycle exhausted its retry budget.
    Failed { error: String },
}

impl WatcherState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// Background poller for the gateway's rollup-info route.
///
/// Spawns a tokio task on construction; the task polls until
/// [`RollupWatcher::shutdown`] cancels it.
pub struct RollupWatcher {
    states: watch::Receiver<WatcherState>,
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
}

impl RollupWatcher {
    /// Validate the configuration and start polling.
    pub fn spawn(config: WatcherConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder().timeout(config.request_timeout).build()?;
        let (tx, rx) = watch::channel(WatcherState::Loading);
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(run_poll_loop(client, config, tx, cancel_token.clone()));

        Ok(Self {
            states: rx,
            cancel_token,
            handle,
        })
    }

    /// Current state snapshot.
    pub fn state(&self) -> WatcherState {
        self.states.borrow().clone()
    }

    /// A receiver that observes every published state change.
    pub fn subscribe(&self) -> watch::Receiver<WatcherState> {
        self.states.clone()
    }

    /// Stop the poll loop. No state update is published after this returns,
    /// and any in-flight request is abandoned rather than awaited.
    pub async fn shutdown(self) {
        self.cancel_token.cancel();
        if let Err(err) = self.handle.await {
            warn!(%err, "watcher task did not shut down cleanly");
        }
    }
}

async fn run_poll_loop(
    client: Client,
    config: WatcherConfig,
    tx: watch::Sender<WatcherState>,
    cancel_token: CancellationToken,
) {
    loop {
        // The in-flight request is abandoned on cancellation so shutdown
        // never waits out a slow gateway.
        let outcome = tokio::select! {
            () = cancel_token.cancelled() => break,
            outcome = poll_with_retries(&client, &config, &cancel_token) => outcome,
        };

        // Cancellation may also have raced the completed cycle; nothing may
        // be published past that point.
        if cancel_token.is_cancelled() {
            break;
        }

        match outcome {
            Ok(info) => {
                let _ = tx.send(WatcherState::Ready {
                    info,
                    updated_at: Utc::now(),
                });
            }
            Err(err) => {
                warn!(%err, "poll cycle failed, will keep polling");
                let _ = tx.send(WatcherState::Failed {
                    error: err.to_string(),
                });
            }
        }

        tokio::select! {
            () = cancel_token.cancelled() => break,
            () = sleep(config.poll_interval) => {}
        }
    }
}

/// One poll cycle: the initial attempt plus up to `error_retries` quick
/// retries. A success anywhere in the budget wins; the last error is
/// surfaced otherwise.
async fn poll_with_retries(
    client: &Client,
    config: &WatcherConfig,
    cancel_token: &CancellationToken,
) -> Result<RollupInfo> {
    let mut attempt = 0;
    loop {
        match poll_once(client, &config.endpoint).await {
            Ok(info) => return Ok(info),
            Err(err) => {
                attempt += 1;
                if attempt > config.error_retries || cancel_token.is_cancelled() {
                    return Err(err);
                }
                warn!(attempt, retries = config.error_retries, %err, "poll attempt failed, retrying");
                tokio::select! {
                    () = cancel_token.cancelled() => return Err(err),
                    () = sleep(config.retry_delay) => {}
                }
            }
        }
    }
}

async fn poll_once(client: &Client, endpoint: &str) -> Result<RollupInfo> {
    let response = client.get(endpoint).send().await?;
    let status = response.status();

    let envelope: RollupInfoResponse = response
        .json()
        .await
        .map_err(|err| WatcherError::InvalidResponse(err.to_string()))?;

    if !envelope.ok {
        return Err(WatcherError::GatewayError {
            status: status.as_u16(),
            message: envelope
                .error
                .unwrap_or_else(|| "gateway reported failure without a message".to_string()),
        });
    }

    envelope.info.ok_or_else(|| {
        WatcherError::InvalidResponse("ok response carried no rollup info".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn loading_is_the_initial_state() {
        let (_, rx) = watch::channel(WatcherState::Loading);
        assert_eq!(*rx.borrow(), WatcherState::Loading);
        assert!(!rx.borrow().is_ready());
    }
}
