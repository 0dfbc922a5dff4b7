//! Request-flow errors and their JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use thiserror::Error;

use crate::provider::{CandidateVariation, ProviderError};
use crate::session::SessionError;

/// Failures of the login-url, callback and verify flows.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No token code could be obtained, so no further provider call was made.
    #[error("Failed to obtain token_code from provider: {0}")]
    ProviderAuthFailed(ProviderError),

    /// Every candidate was rejected, or one was rejected terminally.
    #[error("Failed to generate login URL after {attempts} attempt(s)")]
    LoginUrlGenerationFailed {
        /// Number of candidates submitted
        attempts: usize,
        /// Candidate that produced `last_error`
        candidate: Option<CandidateVariation>,
        /// Error returned for the final attempt
        last_error: Option<ProviderError>,
        /// Configured redirect URL and platform, for troubleshooting output
        registered: CandidateVariation,
    },

    /// The provider failed while validating callback data.
    #[error("Provider call failed: {0}")]
    ProviderUnavailable(ProviderError),

    /// The provider answered but did not vouch for a user.
    #[error("Invalid authentication data")]
    AuthenticationFailed,

    /// Required input is missing or contradictory.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Session token failed verification.
    #[error("Invalid or expired token")]
    InvalidOrExpired(String),

    /// Session token could not be signed.
    #[error("Failed to issue session token: {0}")]
    Session(String),
}

impl From<SessionError> for AuthError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::InvalidOrExpired(reason) => AuthError::InvalidOrExpired(reason),
            SessionError::Signing(reason) => AuthError::Session(reason),
        }
    }
}

/// JSON body returned for every failed auth request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    /// Machine-readable error kind
    pub kind: &'static str,
    /// Short summary
    pub error: String,
    /// Detail, usually the provider's own message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Provider error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    /// Raw provider response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
    /// Candidate that produced the final provider error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<CandidateVariation>,
    /// Hints for operators when the registration values do not match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub troubleshooting: Option<JsonValue>,
}

impl ErrorResponse {
    fn new(kind: &'static str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            kind,
            error: error.into(),
            message: None,
            code: None,
            details: None,
            candidate: None,
            troubleshooting: None,
        }
    }

    fn with_provider_error(mut self, error: &ProviderError) -> Self {
        self.message = Some(error.message().to_string());
        self.code = error.provider_code();
        self.details = error.body().cloned();
        self
    }
}

impl AuthError {
    /// Machine-readable error kind.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::ProviderAuthFailed(_) => "provider_auth_failed",
            AuthError::LoginUrlGenerationFailed { .. } => "login_url_generation_failed",
            AuthError::ProviderUnavailable(_) => "provider_unavailable",
            AuthError::AuthenticationFailed => "authentication_failed",
            AuthError::InvalidRequest(_) => "invalid_request",
            AuthError::InvalidOrExpired(_) => "invalid_or_expired",
            AuthError::Session(_) => "session_error",
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::AuthenticationFailed | AuthError::InvalidOrExpired(_) => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::ProviderAuthFailed(_)
            | AuthError::LoginUrlGenerationFailed { .. }
            | AuthError::ProviderUnavailable(_)
            | AuthError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Builds the JSON body for this error.
    pub fn to_error_response(&self) -> ErrorResponse {
        let kind = self.error_code();
        match self {
            AuthError::ProviderAuthFailed(error) => {
                let mut body =
                    ErrorResponse::new(kind, "Failed to obtain token_code from Allaccess API");
                body.message = Some(format!(
                    "Could not authenticate with Allaccess. Please check your credentials. ({})",
                    error.message()
                ));
                body
            }
            AuthError::LoginUrlGenerationFailed {
                attempts,
                candidate,
                last_error,
                registered,
            } => {
                let mut body = ErrorResponse::new(kind, "Failed to generate login URL");
                match last_error {
                    Some(error) => body = body.with_provider_error(error),
                    None => body.message = Some(format!("No candidate accepted after {attempts} attempt(s)")),
                }
                body.candidate = candidate.clone();
                if last_error.as_ref().is_some_and(ProviderError::is_recoverable) {
                    body.troubleshooting = Some(json!({
                        "issue": "redirect_url or platform does not match CMS registration",
                        "sent": {
                            "redirect_url": registered.redirect_url,
                            "platform": registered.platform,
                        },
                        "attempts": attempts,
                        "action": "Contact Allaccess to verify the exact registered values",
                    }));
                }
                body
            }
            AuthError::ProviderUnavailable(error) => {
                ErrorResponse::new(kind, "Authentication failed").with_provider_error(error)
            }
            AuthError::AuthenticationFailed => {
                ErrorResponse::new(kind, "Invalid authentication data")
            }
            AuthError::InvalidRequest(reason) => ErrorResponse::new(kind, reason.clone()),
            AuthError::InvalidOrExpired(_) => ErrorResponse::new(kind, "Invalid or expired token"),
            AuthError::Session(reason) => {
                tracing::error!("Session signing error: {}", reason);
                let mut body = ErrorResponse::new(kind, "Authentication failed");
                body.message = Some("A token processing error occurred".to_string());
                body
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status_code(), axum::Json(self.to_error_response())).into_response()
    }
}
