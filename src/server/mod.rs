//! HTTP surface
//!
//! - `GET  /api/auth/login-url`
//! - `POST /api/auth/callback`
//! - `GET  /api/auth/verify-token?token=`
//! - `GET  /api/health`

mod handlers;

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::AuthService;
use crate::config::Config;
use crate::error::{Result, SsoError};
use crate::provider::{IdentityProvider, ProviderClient};
use crate::session::SessionIssuer;

/// Builds the router for an auth service.
///
/// `cors_origin` is the single browser origin allowed to call the API with
/// credentials.
///
/// # Errors
///
/// Returns [`SsoError::Config`] if `cors_origin` is not a valid header value.
pub fn router<P>(service: Arc<AuthService<P>>, cors_origin: &str) -> Result<Router>
where
    P: IdentityProvider + 'static,
{
    let origin = HeaderValue::from_str(cors_origin.trim_end_matches('/'))
        .map_err(|e| SsoError::Config(format!("Invalid CORS origin {}: {}", cors_origin, e)))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Ok(Router::new()
        .route("/api/auth/login-url", get(handlers::login_url::<P>))
        .route("/api/auth/callback", post(handlers::callback::<P>))
        .route("/api/auth/verify-token", get(handlers::verify_token::<P>))
        .route("/api/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(service))
}

/// Builds the production auth service from configuration.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or the signing
/// secret is missing.
pub fn build_service(config: &Config) -> Result<AuthService<ProviderClient>> {
    let provider = ProviderClient::new(config.provider.clone())?;
    let issuer = SessionIssuer::from_config(&config.session)?;
    Ok(AuthService::new(provider, issuer, &config.provider))
}

/// Binds the listener and serves until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the service cannot be built or the address cannot
/// be bound.
pub async fn serve(config: Config) -> Result<()> {
    let service = Arc::new(build_service(&config)?);
    let app = router(service, config.cors_origin())?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SsoError::Server(format!("failed to bind {}: {}", addr, e)))?;

    tracing::info!(
        address = %addr,
        client = %config.provider.client_name,
        provider = %config.provider.base_url,
        "SSO bridge listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| SsoError::Server(e.to_string()))?;

    tracing::info!("SSO bridge stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
