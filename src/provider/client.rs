//! HTTP client for the Allaccess identity provider API.
//!
//! Every call is a single JSON `POST` bounded by the configured timeout.
//! Response bodies are decoded leniently: the raw JSON is kept for error
//! diagnostics and only then narrowed into the typed shapes in
//! [`super::types`].
//!
//! # Example
//!
//! ```rust,no_run
//! use ssobridge::config::ProviderConfig;
//! use ssobridge::provider::{IdentityProvider, ProviderClient};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = ProviderClient::new(ProviderConfig::default())?;
//! let token_code = client.fetch_token_code().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use super::types::{
    CheckDataRequest, ExchangeCodeRequest, IdentityEnvelope, LoginUrlRequest, LoginUrlResponse,
    ProviderErrorBody, TokenCode, TokenCodeRequest, TokenCodeResponse, UserIdentity,
    VALUE_MISMATCH_CODE,
};
use super::variations::CandidateVariation;
use super::{IdentityProvider, ProviderError};
use crate::config::ProviderConfig;
use crate::error::{Result, SsoError};

const TOKEN_GET_PATH: &str = "/api/token/get";
const REQUEST_URL_PATH: &str = "/api/auth/request-url";
const CHECK_DATA_PATH: &str = "/api/auth/check-data";
const EXCHANGE_CODE_PATH: &str = "/api/auth/exchange-code";

/// Header carrying the token code on authenticated provider calls.
const TOKEN_HEADER: &str = "allaccess-token";

/// Message the provider attaches to error code 407.
const VALUE_MISMATCH_MESSAGE: &str = "Please provide correct body value!";

/// Allaccess API client.
///
/// Holds a pooled `reqwest::Client` and the provider credentials; cheap to
/// share behind an `Arc` across requests.
pub struct ProviderClient {
    client: Client,
    config: ProviderConfig,
}

impl ProviderClient {
    /// Creates a new provider client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(SsoError::Http)?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Builds a JSON POST authorized with a token code.
    fn token_request(&self, path: &str, token_code: &TokenCode) -> RequestBuilder {
        self.client
            .post(self.url(path))
            .header(TOKEN_HEADER, token_code.as_str())
            .header("Content-Type", "application/json")
    }

    /// Sends a request and returns the status plus the decoded body.
    ///
    /// Bodies that are not JSON are kept as a JSON string; empty bodies
    /// become `null`.
    async fn send(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> std::result::Result<(StatusCode, JsonValue), ProviderError> {
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(path, e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(path, e))?;

        let body = if text.trim().is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_str(&text).unwrap_or(JsonValue::String(text))
        };

        debug!(path, status = status.as_u16(), "Provider responded");
        Ok((status, body))
    }

    fn transport_error(&self, path: &str, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Unavailable(format!(
                "{} timed out after {}ms",
                path, self.config.timeout_ms
            ))
        } else {
            ProviderError::Unavailable(format!("{} request failed: {}", path, error))
        }
    }

    async fn fetch_identity(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> std::result::Result<Option<UserIdentity>, ProviderError> {
        let (status, body) = self.send(path, request).await?;

        if !status.is_success() {
            let error = ProviderErrorBody::from_body(&body);
            warn!(
                path,
                status = status.as_u16(),
                provider_code = ?error.code,
                "Provider rejected identity request"
            );
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                code: error.code,
                message: error.message.unwrap_or_else(|| body.to_string()),
                body,
            });
        }

        let identity = serde_json::from_value::<IdentityEnvelope>(body)
            .ok()
            .and_then(IdentityEnvelope::into_identity);

        match &identity {
            Some(user) => info!(path, user_id = %user.id, "Provider vouched for user"),
            None => warn!(path, "Provider response carried no user identity"),
        }
        Ok(identity)
    }
}

#[async_trait]
impl IdentityProvider for ProviderClient {
    async fn fetch_token_code(&self) -> std::result::Result<TokenCode, ProviderError> {
        let request = self
            .client
            .post(self.url(TOKEN_GET_PATH))
            .header("name", &self.config.name)
            .header("secret_key", &self.config.secret_key)
            .header("Content-Type", "application/json")
            .json(&TokenCodeRequest {
                device_id: self.config.device_id(),
                device_type: self.config.device_type.clone(),
            });

        let (status, body) = self.send(TOKEN_GET_PATH, request).await?;

        if !status.is_success() {
            let error = ProviderErrorBody::from_body(&body);
            warn!(
                status = status.as_u16(),
                provider_code = ?error.code,
                "Token code request rejected"
            );
            return Err(ProviderError::Unavailable(format!(
                "{} returned {}: {}",
                TOKEN_GET_PATH,
                status,
                error.message.unwrap_or_else(|| body.to_string())
            )));
        }

        let token_code = serde_json::from_value::<TokenCodeResponse>(body.clone())
            .ok()
            .and_then(TokenCodeResponse::into_token_code)
            .ok_or_else(|| {
                warn!(body = %body, "Token code missing from provider response");
                ProviderError::Unavailable(format!(
                    "{} response has no data.token.token_code",
                    TOKEN_GET_PATH
                ))
            })?;

        info!(token_code = %token_code, "Obtained provider token code");
        Ok(token_code)
    }

    async fn request_login_url(
        &self,
        token_code: &TokenCode,
        candidate: &CandidateVariation,
    ) -> std::result::Result<String, ProviderError> {
        let request = self
            .token_request(REQUEST_URL_PATH, token_code)
            .header("client_id", &self.config.client_id)
            .header("client_name", &self.config.client_name)
            .header("client_key", &self.config.client_key)
            .json(&LoginUrlRequest {
                redirect_url: &candidate.redirect_url,
                platform: &candidate.platform,
                first_page: "login",
            });

        let (status, body) = self.send(REQUEST_URL_PATH, request).await?;
        let error = ProviderErrorBody::from_body(&body);

        if error.code == Some(VALUE_MISMATCH_CODE) {
            debug!(
                candidate = %candidate.label,
                status = status.as_u16(),
                "Provider reported value mismatch"
            );
            return Err(ProviderError::ValueMismatch {
                status: status.as_u16(),
                message: error
                    .message
                    .unwrap_or_else(|| VALUE_MISMATCH_MESSAGE.to_string()),
                body,
            });
        }

        if !status.is_success() || error.code.is_some() {
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                code: error.code,
                message: error.message.unwrap_or_else(|| body.to_string()),
                body,
            });
        }

        serde_json::from_value::<LoginUrlResponse>(body.clone())
            .ok()
            .and_then(LoginUrlResponse::into_url)
            .ok_or_else(|| {
                ProviderError::Unavailable(format!(
                    "{} response has neither data.url nor url: {}",
                    REQUEST_URL_PATH, body
                ))
            })
    }

    async fn validate_auth_data(
        &self,
        token_code: &TokenCode,
        auth_data: &JsonValue,
    ) -> std::result::Result<Option<UserIdentity>, ProviderError> {
        let request = self
            .token_request(CHECK_DATA_PATH, token_code)
            .json(&CheckDataRequest {
                auth_data,
                client_id: &self.config.client_id,
            });

        self.fetch_identity(CHECK_DATA_PATH, request).await
    }

    async fn exchange_code(
        &self,
        token_code: &TokenCode,
        code: &str,
    ) -> std::result::Result<Option<UserIdentity>, ProviderError> {
        let request = self
            .token_request(EXCHANGE_CODE_PATH, token_code)
            .json(&ExchangeCodeRequest {
                code,
                client_id: &self.config.client_id,
                redirect_url: &self.config.redirect_url,
            });

        self.fetch_identity(EXCHANGE_CODE_PATH, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_new() {
        assert!(ProviderClient::new(ProviderConfig::default()).is_ok());
    }

    #[test]
    fn test_url_joins_base_without_double_slash() {
        let config = ProviderConfig {
            base_url: "https://allaccess.id/".to_string(),
            ..ProviderConfig::default()
        };
        let client = ProviderClient::new(config).unwrap();
        assert_eq!(
            client.url(TOKEN_GET_PATH),
            "https://allaccess.id/api/token/get"
        );
    }

    #[test]
    fn test_token_code_request_serialization() {
        let config = ProviderConfig::default();
        let request = TokenCodeRequest {
            device_id: config.device_id(),
            device_type: config.device_type.clone(),
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"device_id\":\"server-magnum_lawless_18022026-dev\""));
        assert!(json.contains("\"device_type\":\"web\""));
    }

    #[test]
    fn test_login_url_request_serialization() {
        let request = LoginUrlRequest {
            redirect_url: "https://magnum.id/",
            platform: "magnum x lawless",
            first_page: "login",
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["redirect_url"], "https://magnum.id/");
        assert_eq!(json["platform"], "magnum x lawless");
        assert_eq!(json["first_page"], "login");
    }
}
