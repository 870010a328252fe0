//! Clusteer client error types.

use std::sync::Arc;

use clusteer_core::ConfigError;

/// Errors from the Clusteer client.
#[derive(Debug, thiserror::Error)]
pub enum ClusteerError {
    /// Malformed argument to a builder method, or an unusable target URL.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Endpoint configuration could not be resolved.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transport failure (connection refused, DNS, TLS, ...).
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Client-side timeout while talking to the service.
    #[error("request timeout")]
    Timeout,

    /// Service answered with a non-2xx status.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Response body is not the expected JSON.
    #[error("decode error: {0}")]
    Decode(String),

    /// Response body has no `data` field.
    #[error("decode error: response has no `data` field")]
    MissingData,
}

impl ClusteerError {
    /// True when the call to the service did not complete successfully.
    pub fn is_network(&self) -> bool {
        matches!(self, ClusteerError::Network(_) | ClusteerError::Timeout | ClusteerError::HttpError { .. })
    }

    /// True when the service answered but the body could not be decoded.
    pub fn is_decode(&self) -> bool {
        matches!(self, ClusteerError::Decode(_) | ClusteerError::MissingData)
    }
}

impl From<reqwest::Error> for ClusteerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { ClusteerError::Timeout } else { ClusteerError::Network(Arc::new(err)) }
    }
}
