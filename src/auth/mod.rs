//! Login-URL, callback and verify flows
//!
//! [`AuthService`] composes the identity provider, the candidate list and the
//! session issuer. Every call is independent: nothing is cached between
//! requests and each flow fetches its own token code.

pub mod error;

pub use error::{AuthError, ErrorResponse};

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{error, info, warn};

use crate::config::ProviderConfig;
use crate::provider::{candidates_for, CandidateVariation, IdentityProvider, UserIdentity};
use crate::session::{SessionIssuer, SessionToken};

/// Body of `POST /api/auth/callback`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackRequest {
    /// Opaque data the provider appended to the redirect
    #[serde(default)]
    pub auth_data: Option<JsonValue>,
    /// Authorization code the provider appended to the redirect; numeric
    /// codes are accepted and carried as their decimal text
    #[serde(default, deserialize_with = "string_or_number")]
    pub code: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<JsonValue>::deserialize(deserializer)? {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(code)) => Ok(Some(code)),
        Some(JsonValue::Number(code)) => Ok(Some(code.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "code must be a string or number, got {}",
            other
        ))),
    }
}

/// Which provider call a callback request maps to.
#[derive(Debug, Clone, PartialEq)]
enum CallbackInput {
    AuthData(JsonValue),
    Code(String),
}

impl CallbackRequest {
    fn into_input(self) -> Result<CallbackInput, AuthError> {
        let auth_data = self.auth_data.filter(|value| match value {
            JsonValue::Null => false,
            JsonValue::String(s) => !s.is_empty(),
            _ => true,
        });
        let code = self.code.filter(|code| !code.is_empty());

        match (auth_data, code) {
            (Some(auth_data), None) => Ok(CallbackInput::AuthData(auth_data)),
            (None, Some(code)) => Ok(CallbackInput::Code(code)),
            (None, None) => Err(AuthError::InvalidRequest(
                "Missing auth_data or code".to_string(),
            )),
            (Some(_), Some(_)) => Err(AuthError::InvalidRequest(
                "Provide either auth_data or code, not both".to_string(),
            )),
        }
    }
}

/// A login URL accepted by the provider.
#[derive(Debug, Clone)]
pub struct LoginUrl {
    /// URL to send the browser to
    pub url: String,
    /// Candidate the provider accepted
    pub candidate: CandidateVariation,
}

/// Result of a successful callback.
#[derive(Debug, Clone)]
pub struct CallbackOutcome {
    /// Session token for the partner site
    pub session: SessionToken,
    /// Identity the provider vouched for
    pub user: UserIdentity,
}

/// Orchestrates the three auth flows.
pub struct AuthService<P> {
    provider: P,
    issuer: SessionIssuer,
    candidates: Vec<CandidateVariation>,
    registered: CandidateVariation,
}

impl<P: IdentityProvider> AuthService<P> {
    /// Creates the service; the candidate list is resolved once here.
    pub fn new(provider: P, issuer: SessionIssuer, config: &ProviderConfig) -> Self {
        Self {
            provider,
            issuer,
            candidates: candidates_for(config),
            registered: CandidateVariation::new(
                "Configured",
                config.redirect_url.clone(),
                config.platform.clone(),
            ),
        }
    }

    /// Candidates tried by [`login_url`](Self::login_url), in order.
    pub fn candidates(&self) -> &[CandidateVariation] {
        &self.candidates
    }

    /// Obtains a provider login URL.
    ///
    /// Candidates are submitted one at a time. A value mismatch moves on to
    /// the next one; any other provider error stops the loop.
    ///
    /// # Errors
    ///
    /// - [`AuthError::ProviderAuthFailed`] if no token code was obtained
    /// - [`AuthError::LoginUrlGenerationFailed`] if no candidate was accepted
    pub async fn login_url(&self) -> Result<LoginUrl, AuthError> {
        let token_code = self.provider.fetch_token_code().await.map_err(|e| {
            error!(error = %e, "Could not obtain token code for login URL");
            AuthError::ProviderAuthFailed(e)
        })?;

        let mut last_failure = None;

        for (index, candidate) in self.candidates.iter().enumerate() {
            let attempt = index + 1;
            info!(
                attempt,
                candidate = %candidate.label,
                redirect_url = %candidate.redirect_url,
                platform = %candidate.platform,
                "Requesting login URL"
            );

            match self
                .provider
                .request_login_url(&token_code, candidate)
                .await
            {
                Ok(url) => {
                    info!(attempt, candidate = %candidate.label, "Provider accepted candidate");
                    return Ok(LoginUrl {
                        url,
                        candidate: candidate.clone(),
                    });
                }
                Err(e) if e.is_recoverable() => {
                    warn!(attempt, candidate = %candidate.label, "Candidate rejected with value mismatch");
                    last_failure = Some((candidate.clone(), e));
                }
                Err(e) => {
                    error!(attempt, candidate = %candidate.label, error = %e, "Login URL request failed");
                    return Err(self.generation_failed(attempt, Some((candidate.clone(), e))));
                }
            }
        }

        error!(
            attempts = self.candidates.len(),
            "No login URL candidate was accepted"
        );
        Err(self.generation_failed(self.candidates.len(), last_failure))
    }

    fn generation_failed(
        &self,
        attempts: usize,
        failure: Option<(CandidateVariation, crate::provider::ProviderError)>,
    ) -> AuthError {
        let (candidate, last_error) = match failure {
            Some((candidate, error)) => (Some(candidate), Some(error)),
            None => (None, None),
        };
        AuthError::LoginUrlGenerationFailed {
            attempts,
            candidate,
            last_error,
            registered: self.registered.clone(),
        }
    }

    /// Validates callback data with the provider and issues a session token.
    ///
    /// Exactly one of `auth_data` or `code` must be present; the request is
    /// rejected before any provider call otherwise.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidRequest`] for missing or contradictory input
    /// - [`AuthError::ProviderAuthFailed`] if no token code was obtained
    /// - [`AuthError::ProviderUnavailable`] if validation itself failed
    /// - [`AuthError::AuthenticationFailed`] if the provider returned no user
    pub async fn callback(&self, request: CallbackRequest) -> Result<CallbackOutcome, AuthError> {
        let input = request.into_input()?;

        let token_code = self.provider.fetch_token_code().await.map_err(|e| {
            error!(error = %e, "Could not obtain token code for callback validation");
            AuthError::ProviderAuthFailed(e)
        })?;

        let identity = match &input {
            CallbackInput::AuthData(auth_data) => {
                info!("Validating callback auth_data");
                self.provider
                    .validate_auth_data(&token_code, auth_data)
                    .await
            }
            CallbackInput::Code(code) => {
                info!("Exchanging callback code");
                self.provider.exchange_code(&token_code, code).await
            }
        }
        .map_err(|e| {
            error!(error = %e, "Callback validation failed");
            AuthError::ProviderUnavailable(e)
        })?;

        let user = identity.ok_or(AuthError::AuthenticationFailed)?;
        let session = self.issuer.issue(&user)?;

        info!(user_id = %user.id, "Issued session token");
        Ok(CallbackOutcome { session, user })
    }

    /// Verifies a session token.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidRequest`] for an empty token
    /// - [`AuthError::InvalidOrExpired`] for a bad signature or elapsed expiry
    pub fn verify(&self, token: &str) -> Result<UserIdentity, AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidRequest("Missing token".to_string()));
        }
        Ok(self.issuer.verify(token)?)
    }
}
