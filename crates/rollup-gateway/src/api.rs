//! HTTP boundary for the gateway.
//!
//! ## Routes
//!
//! ### `GET /api/mantle/rollup-info`
//!
//! No body, no query parameters.
//!
//! #### Success Response
//!
//! ```json
//! {
//!     "ok": true,
//!     "info": {
//!         "mode": "sequencer",
//!         "syncing": false,
//!         "ethContext": {"blockNumber": 100, "timestamp": 1000},
//!         "rollupContext": {"queueIndex": 5, "index": 5, "verifiedIndex": 4}
//!     }
//! }
//! ```
//!
//! #### Failure Response (HTTP 502)
//!
//! ```json
//! {
//!     "ok": false,
//!     "error": "Mantle RPC HTTP 500"
//! }
//! ```
//!
//! Every upstream failure kind (config, transport, RPC envelope, validation)
//! flattens to the same wire shape; the kind survives in logs and metrics.
//!
//! ### `GET /health`
//!
//! Liveness probe, always 200 `ok`.

use std::{
    convert::Infallible,
    sync::Arc,
    time::Duration,
};

use http_body_util::Full;
use hyper::{
    Method,
    Request,
    Response,
    StatusCode,
    body::Bytes,
    header,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    error::Result,
    rollup::{
        RollupInfo,
        validate_rollup_info,
    },
    transport::{
        CallOptions,
        RpcTransport,
    },
};

/// Path of the rollup status route.
pub const ROLLUP_INFO_PATH: &str = "/api/mantle/rollup-info";
/// Liveness probe path.
pub const HEALTH_PATH: &str = "/health";

/// Upstream method backing the status route.
const ROLLUP_GET_INFO: &str = "rollup_getInfo";

/// Shared per-process state handed to every connection.
#[derive(Clone)]
pub struct GatewayState {
    transport: Arc<RpcTransport>,
    cache_ttl: Option<Duration>,
}

impl GatewayState {
    pub fn new(transport: Arc<RpcTransport>, cache_ttl: Option<Duration>) -> Self {
        Self {
            transport,
            cache_ttl,
        }
    }

    /// Fetch, cache, and validate the current rollup status.
    pub async fn fetch_rollup_info(&self) -> Result<RollupInfo> {
        let raw = self
            .transport
            .call(
                ROLLUP_GET_INFO,
                Vec::new(),
                CallOptions {
                    ttl: self.cache_ttl,
                    cache_key: Some(ROLLUP_GET_INFO.to_string()),
                },
            )
            .await?;
        validate_rollup_info(raw)
    }
}

/// Wire envelope for the rollup status route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollupInfoResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<RollupInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RollupInfoResponse {
    pub fn success(info: RollupInfo) -> Self {
        Self {
            ok: true,
            info: Some(info),
            error: None,
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            ok: false,
            info: None,
            error: Some(message),
        }
    }
}

/// Accept an incoming HTTP request and answer it.
#[tracing::instrument(level = "info", skip_all, target = "api::accept_request")]
pub async fn accept_request<B>(
    request: Request<B>,
    state: GatewayState,
) -> std::result::Result<Response<Full<Bytes>>, Infallible>
where
    B: hyper::body::Body,
{
    let path = request.uri().path();
    let method = request.method();

    if path == HEALTH_PATH && method == Method::GET {
        return Ok(text_response(StatusCode::OK, "ok"));
    }

    if path == ROLLUP_INFO_PATH {
        if method != Method::GET {
            return Ok(text_response(
                StatusCode::METHOD_NOT_ALLOWED,
                "method not allowed",
            ));
        }
        return Ok(rollup_info_response(&state).await);
    }

    Ok(text_response(StatusCode::NOT_FOUND, "not found"))
}

async fn rollup_info_response(state: &GatewayState) -> Response<Full<Bytes>> {
    match state.fetch_rollup_info().await {
        Ok(info) => {
            metrics::counter!("rollup_gateway_requests_total", "outcome" => "ok").increment(1);
            json_response(StatusCode::OK, &RollupInfoResponse::success(info))
        }
        Err(err) => {
            // The wire body flattens the error to a message; keep the kind
            // in logs and metrics.
            tracing::warn!(kind = err.kind(), %err, "rollup info request failed");
            metrics::counter!("rollup_gateway_requests_total", "outcome" => err.kind())
                .increment(1);
            json_response(
                StatusCode::BAD_GATEWAY,
                &RollupInfoResponse::failure(err.to_string()),
            )
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(encoded) => Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(encoded)))
            .unwrap(),
        Err(err) => {
            tracing::error!(%err, "failed to encode response body");
            let mut response = Response::new(Full::new(Bytes::from("encoding failure")));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

fn text_response(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::rollup::RollupNumber;

    fn sample_info() -> RollupInfo {
        RollupInfo {
            mode: "sequencer".to_string(),
            syncing: false,
            eth_context: crate::rollup::EthContext {
                block_number: RollupNumber(100),
                timestamp: RollupNumber(1000),
            },
            rollup_context: crate::rollup::RollupContext {
                queue_index: RollupNumber(5),
                index: RollupNumber(5),
                verified_index: RollupNumber(4),
            },
        }
    }

    #[test]
    fn success_envelope_omits_the_error_member() {
        let encoded = serde_json::to_value(RollupInfoResponse::success(sample_info())).unwrap();
        assert_eq!(encoded["ok"], json!(true));
        assert_eq!(encoded["info"]["rollupContext"]["verifiedIndex"], json!(4));
        assert!(encoded.get("error").is_none());
    }

    #[test]
    fn failure_envelope_omits_the_info_member() {
        let encoded =
            serde_json::to_value(RollupInfoResponse::failure("Mantle RPC HTTP 500".into()))
                .unwrap();
        assert_eq!(
            encoded,
            json!({"ok": false, "error": "Mantle RPC HTTP 500"})
        );
    }

    #[test]
    fn failure_envelope_round_trips() {
        let decoded: RollupInfoResponse =
            serde_json::from_value(json!({"ok": false, "error": "boom"})).unwrap();
        assert!(!decoded.ok);
        assert_eq!(decoded.error.as_deref(), Some("boom"));
        assert!(decoded.info.is_none());
    }
}
