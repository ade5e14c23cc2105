use thiserror::Error;

pub type Result<T, E = GatewayError> = std::result::Result<T, E>;

/// Top level error type for the gateway.
///
/// The HTTP boundary flattens every variant into a `{ok:false, error}` body;
/// [`GatewayError::kind`] keeps the variant family available for logs and
/// metrics labels before that flattening happens.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("missing required environment variable {0}")]
    MissingEnv(String),
    #[error("environment variable {name} holds a malformed EVM address: {reason}")]
    MalformedAddress { name: String, reason: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Non-2xx HTTP status from the upstream RPC endpoint.
    #[error("Mantle RPC HTTP {0}")]
    Transport(u16),
    /// Well-formed JSON-RPC error envelope, regardless of HTTP status.
    #[error("Mantle RPC error code {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("malformed rollup payload: {0}")]
    Validation(String),
    #[error("upstream request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("bind or socket error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Stable label for the error family, used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingEnv(_) | Self::MalformedAddress { .. } | Self::InvalidConfig(_) => {
                "config"
            }
            Self::Transport(_) | Self::Http(_) | Self::Io(_) => "transport",
            Self::Rpc { .. } => "rpc",
            Self::Validation(_) => "validation",
        }
    }
}
