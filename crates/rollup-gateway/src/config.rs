use std::{
    net::SocketAddr,
    sync::Arc,
    time::Duration,
};

use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::{
    api::GatewayState,
    cache::{
        DEFAULT_CACHE_CAPACITY,
        ResponseCache,
    },
    env,
    error::{
        GatewayError,
        Result,
    },
    server::Gateway,
    transport::RpcTransport,
};

/// Runtime configuration for the rollup gateway.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Mantle rollup status gateway", long_about = None)]
pub struct GatewayConfig {
    /// Address the HTTP server listens on
    #[arg(long, env = "GATEWAY_LISTEN_ADDR", default_value = "127.0.0.1:8545")]
    pub listen_addr: SocketAddr,
    /// Upstream Mantle JSON-RPC endpoint. Falls back to PUBLIC_MANTLE_RPC_URL
    /// and then the public Mantle endpoint when unset.
    #[arg(long, env = "MANTLE_RPC_URL")]
    pub rpc_url: Option<Url>,
    /// How long rollup status responses may be served from cache, in
    /// milliseconds. Zero or negative disables caching.
    #[arg(long, env = "GATEWAY_CACHE_TTL_MS", default_value = "5000")]
    pub cache_ttl_ms: i64,
    /// Maximum number of cached upstream responses
    #[arg(long, env = "GATEWAY_CACHE_CAPACITY", default_value_t = DEFAULT_CACHE_CAPACITY)]
    pub cache_capacity: usize,
    /// Bound on a single upstream RPC call, in milliseconds
    #[arg(long, env = "GATEWAY_RPC_TIMEOUT_MS", default_value = "10000")]
    pub rpc_timeout_ms: u64,
    /// Log level
    #[arg(long, env = "GATEWAY_LOG_LEVEL", default_value = "info")]
    pub log_level: LevelFilter,
}

impl GatewayConfig {
    /// Validate a configuration loaded from CLI flags or the environment.
    pub fn validate(self) -> Result<Self> {
        if self.cache_capacity == 0 {
            return Err(GatewayError::InvalidConfig(
                "cache capacity must be at least 1".to_string(),
            ));
        }
        if self.rpc_timeout_ms == 0 {
            return Err(GatewayError::InvalidConfig(
                "rpc timeout must be positive".to_string(),
            ));
        }
        Ok(self)
    }

    /// Upstream endpoint after the environment fallback chain.
    pub fn resolved_rpc_url(&self) -> Result<Url> {
        if let Some(url) = &self.rpc_url {
            return Ok(url.clone());
        }
        let raw = env::resolve_rpc_url();
        Url::parse(&raw)
            .map_err(|err| GatewayError::InvalidConfig(format!("invalid RPC URL {raw:?}: {err}")))
    }

    /// Cache TTL as a duration; `None` disables caching.
    pub fn cache_ttl(&self) -> Option<Duration> {
        u64::try_from(self.cache_ttl_ms)
            .ok()
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    /// Bind the listener and assemble the gateway.
    pub async fn build(self) -> Result<Gateway> {
        let config = self.validate()?;
        let rpc_url = config.resolved_rpc_url()?;

        let listener = TcpListener::bind(&config.listen_addr).await?;
        tracing::info!(listen_addr = ?config.listen_addr, upstream = %rpc_url, "bound gateway listener");

        let cache = Arc::new(ResponseCache::new(config.cache_capacity));
        let transport = Arc::new(RpcTransport::new(
            rpc_url,
            cache,
            Duration::from_millis(config.rpc_timeout_ms),
        )?);
        let state = GatewayState::new(transport, config.cache_ttl());

        Ok(Gateway::new(listener, state))
    }
}
