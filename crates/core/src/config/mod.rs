//! Clusteer endpoint configuration with layered loading.
//!
//! Configuration is loaded with figment from multiple sources:
//!
//! 1. Environment variables (CLUSTEER_*)
//! 2. TOML config file (if CLUSTEER_CONFIG_FILE set)
//! 3. Built-in defaults

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Configuration for reaching a Clusteer service.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (CLUSTEER_*)
/// 2. TOML config file (if CLUSTEER_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusteerConfig {
    /// Base URL of the Clusteer service.
    ///
    /// Set via CLUSTEER_ENDPOINT environment variable.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Client-side timeout for the call to the service, in milliseconds.
    ///
    /// This bounds the socket wait only. The crawl duration on the service
    /// is controlled by the `timeout` query parameter.
    ///
    /// Set via CLUSTEER_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// User-Agent sent to the Clusteer service itself.
    ///
    /// Set via CLUSTEER_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_endpoint() -> String {
    "http://localhost:8080".into()
}

fn default_timeout_ms() -> u64 {
    90_000
}

fn default_user_agent() -> String {
    "clusteer-rs/0.1".into()
}

impl Default for ClusteerConfig {
    fn default() -> Self {
        Self { endpoint: default_endpoint(), timeout_ms: default_timeout_ms(), user_agent: default_user_agent() }
    }
}

impl ClusteerConfig {
    /// Defaults pointed at the given endpoint.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), ..Default::default() }
    }

    /// Timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parse the endpoint into a URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the endpoint is not an absolute
    /// http(s) URL.
    pub fn endpoint_url(&self) -> Result<url::Url, ConfigError> {
        let trimmed = self.endpoint.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::Missing {
                field: "endpoint".into(),
                hint: "Set CLUSTEER_ENDPOINT environment variable".into(),
            });
        }

        let parsed = url::Url::parse(trimmed)
            .map_err(|e| ConfigError::Invalid { field: "endpoint".into(), reason: e.to_string() })?;

        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            scheme => Err(ConfigError::Invalid {
                field: "endpoint".into(),
                reason: format!("unsupported scheme: {scheme}"),
            }),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("CLUSTEER_CONFIG_FILE") {
            tracing::debug!(path = %config_path, "merging Clusteer config file");
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("CLUSTEER_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into()),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
