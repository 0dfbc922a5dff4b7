//! Configuration management for SSO Bridge
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//!
//! Secrets (provider credentials and the session signing secret) have no
//! defaults. [`Config::validate`] refuses to start without them.

use crate::error::{Result, SsoError};
use crate::provider::variations::CandidateVariation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for SSO Bridge
///
/// Built once at startup and shared read-only with the provider client,
/// the session issuer and the HTTP server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Identity provider credentials and registration values
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Session token settings
    #[serde(default)]
    pub session: SessionConfig,

    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Identity provider configuration
///
/// `redirect_url` and `platform` must match what is registered with the
/// provider exactly; see [`crate::provider::variations`] for the formats
/// that are tried.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider account name, sent as the `name` header
    #[serde(default = "default_provider_name")]
    pub name: String,

    /// Provider account secret, sent as the `secret_key` header
    #[serde(default)]
    pub secret_key: String,

    /// Registered client identifier
    #[serde(default)]
    pub client_id: String,

    /// Registered client key
    #[serde(default)]
    pub client_key: String,

    /// Registered client name
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// Registered redirect URL
    #[serde(default = "default_redirect_url")]
    pub redirect_url: String,

    /// Registered platform string
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Provider API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Device type reported when requesting a token code
    #[serde(default = "default_device_type")]
    pub device_type: String,

    /// Hard timeout for each outbound call, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Explicit candidate list; replaces the generated variations when set
    #[serde(default)]
    pub candidates: Vec<CandidateVariation>,
}

fn default_provider_name() -> String {
    "sso-magnum-lawless-prd".to_string()
}

fn default_client_name() -> String {
    "magnum_lawless_18022026".to_string()
}

fn default_redirect_url() -> String {
    "https://magnum.id/".to_string()
}

fn default_platform() -> String {
    "magnum x lawless".to_string()
}

fn default_base_url() -> String {
    "https://allaccess.id".to_string()
}

fn default_device_type() -> String {
    "web".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl ProviderConfig {
    /// Timeout applied to every outbound provider call
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Device identifier reported to the token endpoint
    pub fn device_id(&self) -> String {
        format!("server-{}-dev", self.client_name)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            secret_key: String::new(),
            client_id: String::new(),
            client_key: String::new(),
            client_name: default_client_name(),
            redirect_url: default_redirect_url(),
            platform: default_platform(),
            base_url: default_base_url(),
            device_type: default_device_type(),
            timeout_ms: default_timeout_ms(),
            candidates: Vec::new(),
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("secret_key", &redact(&self.secret_key))
            .field("client_id", &self.client_id)
            .field("client_key", &redact(&self.client_key))
            .field("client_name", &self.client_name)
            .field("redirect_url", &self.redirect_url)
            .field("platform", &self.platform)
            .field("base_url", &self.base_url)
            .field("device_type", &self.device_type)
            .field("timeout_ms", &self.timeout_ms)
            .field("candidates", &self.candidates)
            .finish()
    }
}

/// Session token configuration
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// HMAC secret used to sign and verify session tokens
    #[serde(default)]
    pub signing_secret: String,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("signing_secret", &redact(&self.signing_secret))
            .finish()
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origin; falls back to the provider redirect URL
    #[serde(default)]
    pub cors_origin: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "ssobridge=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

/// Reads and parses an environment variable; unset is `None`, unparseable
/// is an error naming the variable.
fn parse_env<T>(var: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|e| {
            SsoError::Config(format!("{} has invalid value {:?}: {}", var, raw, e)).into()
        }),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error: defaults are used and the
    /// environment is expected to supply the secrets.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed, or
    /// if `SSO_CANDIDATES` is not a valid JSON candidate list.
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars()?;
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SsoError::Config(format!("Failed to read config file: {}", e)))?;
        let config = serde_yaml::from_str(&contents).map_err(SsoError::Yaml)?;
        Ok(config)
    }

    fn apply_env_vars(&mut self) -> Result<()> {
        let provider = &mut self.provider;
        let string_overrides: [(&str, &mut String); 9] = [
            ("SSO_NAME", &mut provider.name),
            ("SSO_SECRET_KEY", &mut provider.secret_key),
            ("SSO_CLIENT_ID", &mut provider.client_id),
            ("SSO_CLIENT_KEY", &mut provider.client_key),
            ("SSO_CLIENT_NAME", &mut provider.client_name),
            ("SSO_REDIRECT_URL", &mut provider.redirect_url),
            ("SSO_PLATFORM", &mut provider.platform),
            ("ALLACCESS_BASE_URL", &mut provider.base_url),
            ("JWT_SECRET", &mut self.session.signing_secret),
        ];
        for (var, field) in string_overrides {
            if let Ok(value) = std::env::var(var) {
                *field = value;
                tracing::debug!("Env override: {}", var);
            }
        }

        if let Some(timeout) = parse_env("SSO_TIMEOUT_MS")? {
            self.provider.timeout_ms = timeout;
        }

        if let Ok(raw) = std::env::var("SSO_CANDIDATES") {
            self.provider.candidates = serde_json::from_str(&raw).map_err(|e| {
                SsoError::Config(format!("SSO_CANDIDATES must be a JSON array: {}", e))
            })?;
        }

        if let Ok(host) = std::env::var("SSO_BIND_HOST") {
            self.server.host = host;
        }

        if let Some(port) = parse_env("PORT")? {
            self.server.port = port;
        }

        if let Ok(origin) = std::env::var("CORS_ORIGIN") {
            self.server.cors_origin = Some(origin);
        }

        if let Some(json) = parse_env("SSO_LOG_JSON")? {
            self.logging.json = json;
        }

        Ok(())
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.json_logs {
            self.logging.json = true;
        }
        if cli.verbose {
            self.logging.level = "ssobridge=debug".to_string();
        }
        if let Some(crate::cli::Commands::Serve { port: Some(port) }) = &cli.command {
            self.server.port = *port;
        }
    }

    /// Origin allowed by the CORS layer
    pub fn cors_origin(&self) -> &str {
        self.server
            .cors_origin
            .as_deref()
            .unwrap_or(&self.provider.redirect_url)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`SsoError::MissingConfig`] naming the environment variable
    /// for any absent secret, and [`SsoError::Config`] for malformed values.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("SSO_SECRET_KEY", &self.provider.secret_key),
            ("SSO_CLIENT_ID", &self.provider.client_id),
            ("SSO_CLIENT_KEY", &self.provider.client_key),
            ("JWT_SECRET", &self.session.signing_secret),
        ];
        for (var, value) in required {
            if value.trim().is_empty() {
                return Err(SsoError::MissingConfig(var.to_string()).into());
            }
        }

        if self.session.signing_secret.len() < 32 {
            tracing::warn!("JWT_SECRET is shorter than 32 bytes");
        }

        for (field, value) in [
            ("provider.base_url", &self.provider.base_url),
            ("provider.redirect_url", &self.provider.redirect_url),
        ] {
            url::Url::parse(value).map_err(|e| {
                SsoError::Config(format!("{} is not a valid URL ({}): {}", field, value, e))
            })?;
        }

        if self.provider.platform.trim().is_empty() {
            return Err(SsoError::Config("provider.platform cannot be empty".to_string()).into());
        }

        if self.provider.timeout_ms == 0 {
            return Err(SsoError::Config(
                "provider.timeout_ms must be greater than 0".to_string(),
            )
            .into());
        }

        if self.server.port == 0 {
            return Err(
                SsoError::Config("server.port must be greater than 0".to_string()).into(),
            );
        }

        for (index, candidate) in self.provider.candidates.iter().enumerate() {
            if candidate.redirect_url.is_empty() || candidate.platform.is_empty() {
                return Err(SsoError::Config(format!(
                    "provider.candidates[{}] needs both redirect_url and platform",
                    index
                ))
                .into());
            }
        }

        Ok(())
    }
}
