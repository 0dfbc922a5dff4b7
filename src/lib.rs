//! SSO Bridge - Allaccess single-sign-on adapter library
//!
//! This library brokers logins between a partner website and the Allaccess
//! identity provider, and issues short-lived session tokens the partner
//! front end can verify.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `provider`: Allaccess HTTP client, wire types, and redirect/platform candidates
//! - `session`: 15-minute HS256 session tokens
//! - `auth`: Login-URL discovery and callback orchestration
//! - `server`: axum routes exposing the flows over HTTP
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ssobridge::{server, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let service = Arc::new(server::build_service(&config)?);
//!     let _app = server::router(service, config.cors_origin())?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod server;
pub mod session;

pub use auth::{AuthError, AuthService};
pub use config::Config;
pub use error::{Result, SsoError};
pub use provider::{IdentityProvider, ProviderClient};
pub use session::SessionIssuer;
