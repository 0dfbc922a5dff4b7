//! Identity provider (Allaccess) integration
//!
//! - [`client`]     -- HTTP client for the four provider endpoints
//! - [`types`]      -- request/response wire shapes and [`UserIdentity`]
//! - [`variations`] -- redirect-URL/platform candidates for the login request
//!
//! The [`IdentityProvider`] trait is the seam between the request flows in
//! [`crate::auth`] and the network; [`ProviderClient`] is the production
//! implementation.

pub mod client;
pub mod types;
pub mod variations;

pub use client::ProviderClient;
pub use types::{TokenCode, UserIdentity};
pub use variations::{candidates_for, resolve_candidates, CandidateVariation};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Failures talking to the identity provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Network failure, timeout, or a response that does not have the
    /// expected shape.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// The provider answered error code 407: the submitted
    /// `redirect_url`/`platform` pair is not the registered one. The next
    /// candidate may still succeed.
    #[error("Provider value mismatch ({status}): {message}")]
    ValueMismatch {
        /// HTTP status of the response
        status: u16,
        /// Provider error message
        message: String,
        /// Raw response body
        body: JsonValue,
    },

    /// The provider refused the request for any other reason.
    #[error("Provider rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status of the response
        status: u16,
        /// Provider error code, when the body carries one
        code: Option<i64>,
        /// Provider error message, or the raw body text
        message: String,
        /// Raw response body
        body: JsonValue,
    },
}

impl ProviderError {
    /// Whether the login flow should move on to the next candidate.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ProviderError::ValueMismatch { .. })
    }

    /// Provider-defined error code, if any.
    pub fn provider_code(&self) -> Option<i64> {
        match self {
            ProviderError::ValueMismatch { .. } => Some(types::VALUE_MISMATCH_CODE),
            ProviderError::Rejected { code, .. } => *code,
            ProviderError::Unavailable(_) => None,
        }
    }

    /// Human-readable message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            ProviderError::Unavailable(message)
            | ProviderError::ValueMismatch { message, .. }
            | ProviderError::Rejected { message, .. } => message,
        }
    }

    /// Raw provider response body, if one was received.
    pub fn body(&self) -> Option<&JsonValue> {
        match self {
            ProviderError::ValueMismatch { body, .. } | ProviderError::Rejected { body, .. } => {
                Some(body)
            }
            ProviderError::Unavailable(_) => None,
        }
    }
}

/// Calls the request flows make against the identity provider.
///
/// Every method performs at most one outbound request and never retries.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Obtains a fresh token code from `/api/token/get`.
    async fn fetch_token_code(&self) -> Result<TokenCode, ProviderError>;

    /// Requests a login URL for one candidate from `/api/auth/request-url`.
    ///
    /// A [`ProviderError::ValueMismatch`] means the candidate was not the
    /// registered one.
    async fn request_login_url(
        &self,
        token_code: &TokenCode,
        candidate: &CandidateVariation,
    ) -> Result<String, ProviderError>;

    /// Validates callback `auth_data` via `/api/auth/check-data`.
    ///
    /// `Ok(None)` means the provider answered but did not vouch for a user.
    async fn validate_auth_data(
        &self,
        token_code: &TokenCode,
        auth_data: &JsonValue,
    ) -> Result<Option<UserIdentity>, ProviderError>;

    /// Exchanges a callback `code` via `/api/auth/exchange-code`.
    ///
    /// `Ok(None)` means the provider answered but did not vouch for a user.
    async fn exchange_code(
        &self,
        token_code: &TokenCode,
        code: &str,
    ) -> Result<Option<UserIdentity>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_only_value_mismatch_is_recoverable() {
        let mismatch = ProviderError::ValueMismatch {
            status: 400,
            message: "Please provide correct body value!".to_string(),
            body: json!({}),
        };
        let rejected = ProviderError::Rejected {
            status: 403,
            code: Some(402),
            message: "bad token".to_string(),
            body: json!({}),
        };
        let unavailable = ProviderError::Unavailable("timed out".to_string());

        assert!(mismatch.is_recoverable());
        assert!(!rejected.is_recoverable());
        assert!(!unavailable.is_recoverable());
    }

    #[test]
    fn test_provider_code_and_message() {
        let mismatch = ProviderError::ValueMismatch {
            status: 200,
            message: "mismatch".to_string(),
            body: json!({"error": {"code": 407}}),
        };
        assert_eq!(mismatch.provider_code(), Some(407));
        assert_eq!(mismatch.message(), "mismatch");
        assert!(mismatch.body().is_some());

        let unavailable = ProviderError::Unavailable("down".to_string());
        assert_eq!(unavailable.provider_code(), None);
        assert_eq!(unavailable.to_string(), "Provider unavailable: down");
        assert!(unavailable.body().is_none());
    }
}
