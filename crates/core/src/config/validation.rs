//! Configuration validation rules.
//!
//! Checks `ClusteerConfig` values after they have been loaded from
//! environment, files, or defaults.

use crate::config::ClusteerConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl ClusteerConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `endpoint` is empty or not an absolute http(s) URL
    /// - `timeout_ms` is less than 100ms or exceeds 10 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.endpoint_url()?;

        if endpoint.query().is_some() {
            tracing::warn!(
                endpoint = %endpoint,
                "Clusteer endpoint already carries a query string; crawl parameters with the same key replace its pairs"
            );
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 600_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 10 minutes (600000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = ClusteerConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_missing_endpoint() {
        let config = ClusteerConfig { endpoint: "   ".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Missing { field, .. }) if field == "endpoint"));
    }

    #[test]
    fn test_validate_relative_endpoint() {
        let config = ClusteerConfig { endpoint: "/crawl".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "endpoint"));
    }

    #[test]
    fn test_validate_timeout_too_small() {
        let config = ClusteerConfig { timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_timeout_exceeds_limit() {
        let config = ClusteerConfig { timeout_ms: 600_001, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = ClusteerConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = ClusteerConfig { timeout_ms: 100, ..Default::default() };
        assert!(config.validate().is_ok());

        let config = ClusteerConfig { timeout_ms: 600_000, ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
