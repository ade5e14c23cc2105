//! JSON-RPC 2.0 transport for the Mantle upstream.
//!
//! One POST per call, no automatic retry. The transport consults the injected
//! [`ResponseCache`] before touching the network and hands back results as
//! opaque [`RawPayload`]s: an unvalidated payload can only become a typed
//! [`crate::rollup::RollupInfo`] by passing through the schema validator.

use std::{
    sync::{
        Arc,
        atomic::{
            AtomicU64,
            Ordering,
        },
    },
    time::Duration,
};

use reqwest::{
    Client,
    header,
};
use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;
use url::Url;

use crate::{
    cache::ResponseCache,
    error::{
        GatewayError,
        Result,
    },
};

/// Default bound on a single upstream call.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// Untyped JSON returned by the upstream RPC.
///
/// Deliberately opaque outside the crate: callers cannot read fields off an
/// unchecked payload, only feed it to the validator.
#[derive(Debug, Clone)]
pub struct RawPayload(Value);

impl RawPayload {
    pub(crate) fn into_value(self) -> Value {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn for_tests(value: Value) -> Self {
        Self(value)
    }
}

/// Per-call knobs: cache TTL and an optional explicit cache key.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// How long the response may be served from cache. `None` or zero
    /// bypasses the cache for this call.
    pub ttl: Option<Duration>,
    /// Override for the derived method+params cache key.
    pub cache_key: Option<String>,
}

/// JSON-RPC request envelope.
#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a [Value],
}

/// JSON-RPC response envelope, success or error.
#[derive(Debug, Deserialize)]
struct RpcResponse {
    jsonrpc: String,
    id: Option<u64>,
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// HTTP client for a single upstream JSON-RPC endpoint.
pub struct RpcTransport {
    http: Client,
    endpoint: Url,
    cache: Arc<ResponseCache>,
    request_id: AtomicU64,
}

impl RpcTransport {
    /// Build a transport against `endpoint` with the given per-call timeout.
    pub fn new(endpoint: Url, cache: Arc<ResponseCache>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint,
            cache,
            request_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Issue a JSON-RPC call, letting the response cache short-circuit it.
    pub async fn call(
        &self,
        method: &str,
        params: Vec<Value>,
        options: CallOptions,
    ) -> Result<RawPayload> {
        let key = options
            .cache_key
            .unwrap_or_else(|| ResponseCache::call_key(method, &params));
        let value = self
            .cache
            .get_or_compute(&key, options.ttl, || self.issue(method, &params))
            .await?;
        Ok(RawPayload(value))
    }

    /// One upstream round trip: build the envelope, POST, decode.
    async fn issue(&self, method: &str, params: &[Value]) -> Result<Value> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            // The response cache is the only caching layer; keep
            // intermediaries from replaying stale bodies.
            .header(header::CACHE_CONTROL, "no-store")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            metrics::counter!("rollup_gateway_upstream_error_total", "kind" => "transport")
                .increment(1);
            return Err(GatewayError::Transport(status.as_u16()));
        }

        let body: RpcResponse = response.json().await?;
        if let Some(error) = body.error {
            metrics::counter!("rollup_gateway_upstream_error_total", "kind" => "rpc")
                .increment(1);
            return Err(GatewayError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        // Error envelopes may carry a null id; only successful responses are
        // held to the echo-the-request rule.
        if body.jsonrpc != "2.0" {
            return Err(GatewayError::Validation(format!(
                "unexpected JSON-RPC version {:?}",
                body.jsonrpc
            )));
        }
        if body.id != Some(id) {
            return Err(GatewayError::Validation(format!(
                "response id {:?} does not match request id {id}",
                body.id
            )));
        }

        body.result.ok_or_else(|| {
            GatewayError::Validation("response carried neither result nor error".to_string())
        })
    }
}
