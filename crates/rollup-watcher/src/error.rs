//! Error types for the rollup watcher

use thiserror::Error;

/// Main error type for the rollup watcher
#[derive(Debug, Error)]
pub enum WatcherError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// URL parse error
    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    /// Response body did not decode as the gateway envelope
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The gateway answered with `{ok:false}`
    #[error("Gateway error (HTTP {status}): {message}")]
    GatewayError { status: u16, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for the rollup watcher
pub type Result<T> = std::result::Result<T, WatcherError>;

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_gateway_error_message() {
        let error = WatcherError::GatewayError {
            status: 502,
            message: "Mantle RPC HTTP 500".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Gateway error (HTTP 502): Mantle RPC HTTP 500"
        );
    }

    #[test]
    fn test_config_error_creation() {
        let error = WatcherError::ConfigError("endpoint cannot be empty".to_string());
        assert_eq!(
            error.to_string(),
            "Configuration error: endpoint cannot be empty"
        );
        assert_matches!(error, WatcherError::ConfigError(msg) if msg == "endpoint cannot be empty");
    }

    #[test]
    fn test_url_parse_error_conversion() {
        let parse_err = url::Url::parse("not a url").unwrap_err();
        let error = WatcherError::from(parse_err);
        assert_matches!(error, WatcherError::UrlParseError(_));
        assert!(error.to_string().contains("URL parse error"));
    }
}
