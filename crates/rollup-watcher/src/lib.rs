//! Polling client for the rollup status gateway.
//!
//! [`RollupWatcher`] runs a background tokio task that polls the gateway's
//! `GET /api/mantle/rollup-info` route on a fixed interval and publishes the
//! latest observation over a `tokio::sync::watch` channel. Consumers never
//! see a crash on upstream failure, only a [`WatcherState::Failed`] value,
//! and the loop keeps polling until it is shut down.

pub mod config;
pub mod error;
pub mod watcher;

pub use config::WatcherConfig;
pub use error::{
    Result,
    WatcherError,
};
pub use watcher::{
    RollupWatcher,
    WatcherState,
};
