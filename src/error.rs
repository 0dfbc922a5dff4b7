//! Error types for SSO Bridge
//!
//! This module defines the crate-level error type used during startup,
//! configuration loading and CLI commands, using `thiserror` for ergonomic
//! error handling. Request-scoped failures live closer to where they occur:
//! [`ProviderError`](crate::provider::ProviderError) for the identity
//! provider client and [`AuthError`](crate::auth::AuthError) for the
//! request flows and their HTTP mapping.

use thiserror::Error;

/// Main error type for SSO Bridge operations
#[derive(Error, Debug)]
pub enum SsoError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required configuration value is absent
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    /// Server bootstrap errors (bind, serve)
    #[error("Server error: {0}")]
    Server(String),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for SSO Bridge operations
///
/// Uses `anyhow::Error` so startup and CLI code can attach context while
/// still propagating [`SsoError`] values.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = SsoError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_missing_config_error_display() {
        let error = SsoError::MissingConfig("JWT_SECRET".to_string());
        assert_eq!(
            error.to_string(),
            "Missing required configuration: JWT_SECRET"
        );
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("key: [unclosed").unwrap_err();
        let error: SsoError = yaml_error.into();
        assert!(matches!(error, SsoError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SsoError>();
    }
}
