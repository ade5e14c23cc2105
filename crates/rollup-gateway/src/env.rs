//! Environment resolution for the gateway.
//!
//! Every on-chain-address-dependent code path goes through these helpers: a
//! missing required value is a fatal configuration error, never a silent
//! placeholder. Values that are set but empty count as missing, matching the
//! dotenv convention where a blank assignment means "unset".

use alloy_primitives::Address;

use crate::error::{
    GatewayError,
    Result,
};

/// Server-preferred RPC endpoint variable.
pub const RPC_URL_VAR: &str = "MANTLE_RPC_URL";
/// Public fallback consulted when [`RPC_URL_VAR`] is unset.
pub const PUBLIC_RPC_URL_VAR: &str = "PUBLIC_MANTLE_RPC_URL";
/// Compiled-in last-resort endpoint.
pub const DEFAULT_RPC_URL: &str = "https://rpc.mantle.xyz";

/// Look up a required environment variable.
pub fn resolve_required(name: &str) -> Result<String> {
    resolve_optional(name).ok_or_else(|| GatewayError::MissingEnv(name.to_string()))
}

/// Look up an optional environment variable. Empty values resolve to `None`.
pub fn resolve_optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Look up a required environment variable holding an EVM address and return
/// it in EIP-55 checksummed form.
///
/// A present-but-malformed value fails with a distinct error from a missing
/// one so operators can tell a typo apart from an unset deployment variable.
pub fn resolve_required_address(name: &str) -> Result<String> {
    let raw = resolve_required(name)?;
    let address: Address = raw
        .trim()
        .parse()
        .map_err(|err| GatewayError::MalformedAddress {
            name: name.to_string(),
            reason: format!("{err}"),
        })?;
    Ok(address.to_checksum(None))
}

/// Resolve the upstream RPC URL through the fallback chain:
/// server-preferred variable, then the public variable, then the compiled-in
/// default endpoint.
pub fn resolve_rpc_url() -> String {
    resolve_rpc_url_with(resolve_optional)
}

// The lookup is injectable so tests can exercise the chain without mutating
// process-wide variables other tests read concurrently.
fn resolve_rpc_url_with(lookup: impl Fn(&str) -> Option<String>) -> String {
    lookup(RPC_URL_VAR)
        .or_else(|| lookup(PUBLIC_RPC_URL_VAR))
        .unwrap_or_else(|| DEFAULT_RPC_URL.to_string())
}
