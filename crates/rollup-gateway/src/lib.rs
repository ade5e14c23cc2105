//! Mantle rollup status gateway.
//!
//! This crate exposes two integration surfaces:
//!
//! - [`Gateway`], a ready-to-run HTTP server that answers
//!   `GET /api/mantle/rollup-info` with a validated snapshot of the Mantle
//!   rollup's sequencer/verifier status.
//! - Library pieces ([`RpcTransport`], [`ResponseCache`],
//!   [`rollup::validate_rollup_info`]) that other services can embed without
//!   running the standalone server.
//!
//! Reads go through a single pipeline: the transport issues one JSON-RPC 2.0
//! `rollup_getInfo` call against the configured Mantle endpoint, the response
//! cache collapses identical calls inside the TTL window, and the validator
//! turns the untyped payload into a [`rollup::RollupInfo`] before anything
//! leaves the process.

pub mod api;
pub mod cache;
pub mod config;
pub mod env;
pub mod error;
pub mod rollup;
pub mod server;
pub mod transport;

pub use cache::ResponseCache;
pub use config::GatewayConfig;
pub use error::{
    GatewayError,
    Result,
};
pub use server::Gateway;
pub use transport::RpcTransport;
