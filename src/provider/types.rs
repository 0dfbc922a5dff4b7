//! Wire types for the identity provider API
//!
//! Response bodies are read as raw JSON first so the raw payload can be
//! attached to errors, then narrowed into these shapes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Provider error code meaning "redirect_url or platform does not match the
/// registered value".
pub const VALUE_MISMATCH_CODE: i64 = 407;

/// Payload `code` that marks a successful check-data or exchange-code call.
pub const PAYLOAD_SUCCESS_CODE: i64 = 200;

/// Short-lived token code issued by `/api/token/get`.
///
/// Authorizes exactly one request chain. `Debug` and `Display` only reveal
/// a prefix so the value never lands in logs whole.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenCode(String);

impl TokenCode {
    /// Wraps a raw token code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Raw value for the `allaccess-token` header.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn prefix(&self) -> String {
        let prefix: String = self.0.chars().take(10).collect();
        format!("{}...", prefix)
    }
}

impl fmt::Debug for TokenCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TokenCode").field(&self.prefix()).finish()
    }
}

impl fmt::Display for TokenCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix())
    }
}

/// Authenticated user returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Provider user identifier
    pub id: String,
    /// Email address, when the provider shares it
    #[serde(default)]
    pub email: Option<String>,
    /// Display name, when the provider shares it
    #[serde(default)]
    pub name: Option<String>,
}

impl UserIdentity {
    /// Extracts an identity from a provider user object.
    ///
    /// The identifier is read from `id`, falling back to `userId`; numeric
    /// identifiers are rendered as strings. Returns `None` when neither is
    /// present.
    pub fn from_value(value: &JsonValue) -> Option<Self> {
        let id = ["id", "userId"]
            .iter()
            .filter_map(|key| value.get(*key))
            .find_map(|id| match id {
                JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
                JsonValue::Number(n) => Some(n.to_string()),
                _ => None,
            })?;

        let text = |key: &str| value.get(key).and_then(JsonValue::as_str).map(str::to_string);

        Some(Self {
            id,
            email: text("email"),
            name: text("name"),
        })
    }
}

/// Body sent to `/api/token/get`.
#[derive(Debug, Serialize)]
pub struct TokenCodeRequest {
    /// Fixed device identifier for this server
    pub device_id: String,
    /// Device type, `web` by default
    pub device_type: String,
}

/// `{ data: { token: { token_code } } }`
#[derive(Debug, Deserialize)]
pub struct TokenCodeResponse {
    #[serde(default)]
    pub data: Option<TokenCodeData>,
}

#[derive(Debug, Deserialize)]
pub struct TokenCodeData {
    #[serde(default)]
    pub token: Option<TokenCodeToken>,
}

#[derive(Debug, Deserialize)]
pub struct TokenCodeToken {
    #[serde(default)]
    pub token_code: Option<String>,
}

impl TokenCodeResponse {
    /// The token code, if the response has the expected nested shape.
    pub fn into_token_code(self) -> Option<TokenCode> {
        self.data
            .and_then(|data| data.token)
            .and_then(|token| token.token_code)
            .filter(|code| !code.is_empty())
            .map(TokenCode::new)
    }
}

/// Body sent to `/api/auth/request-url`.
#[derive(Debug, Serialize)]
pub struct LoginUrlRequest<'a> {
    pub redirect_url: &'a str,
    pub platform: &'a str,
    pub first_page: &'a str,
}

/// Login URL response; the URL sits under `data.url` or at the top level.
#[derive(Debug, Deserialize)]
pub struct LoginUrlResponse {
    #[serde(default)]
    pub data: Option<LoginUrlData>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginUrlData {
    #[serde(default)]
    pub url: Option<String>,
}

impl LoginUrlResponse {
    /// The login URL from whichever of the two accepted shapes is present.
    pub fn into_url(self) -> Option<String> {
        self.data
            .and_then(|data| data.url)
            .or(self.url)
            .filter(|url| !url.is_empty())
    }
}

/// Body sent to `/api/auth/check-data`.
#[derive(Debug, Serialize)]
pub struct CheckDataRequest<'a> {
    pub auth_data: &'a JsonValue,
    pub client_id: &'a str,
}

/// Body sent to `/api/auth/exchange-code`.
#[derive(Debug, Serialize)]
pub struct ExchangeCodeRequest<'a> {
    pub code: &'a str,
    pub client_id: &'a str,
    pub redirect_url: &'a str,
}

/// Envelope shared by check-data and exchange-code: `{ code, data }`.
#[derive(Debug, Deserialize)]
pub struct IdentityEnvelope {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub data: Option<JsonValue>,
}

impl IdentityEnvelope {
    /// The identity carried by a successful envelope.
    ///
    /// Requires `code == 200` and a `data` object. The user is read from
    /// `data.user` when present, otherwise from `data` itself.
    pub fn into_identity(self) -> Option<UserIdentity> {
        if self.code != Some(PAYLOAD_SUCCESS_CODE) {
            return None;
        }
        let data = self.data.filter(|data| !data.is_null())?;
        let user = data.get("user").unwrap_or(&data);
        UserIdentity::from_value(user)
    }
}

/// Error object the provider embeds as `{ error: { code, message } }`.
#[derive(Debug, Default, Deserialize)]
pub struct ProviderErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ProviderErrorBody {
    /// Reads the nested error object, falling back to a top-level `message`.
    pub fn from_body(body: &JsonValue) -> Self {
        let mut parsed = body
            .get("error")
            .filter(|error| error.is_object())
            .and_then(|error| serde_json::from_value::<ProviderErrorBody>(error.clone()).ok())
            .unwrap_or_default();
        if parsed.message.is_none() {
            parsed.message = body
                .get("message")
                .and_then(JsonValue::as_str)
                .map(str::to_string);
        }
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_code_debug_hides_value() {
        let code = TokenCode::new("abcdefghijklmnopqrstuvwxyz");
        let debug = format!("{:?}", code);
        assert!(debug.contains("abcdefghij..."));
        assert!(!debug.contains("klmnop"));
        assert_eq!(code.as_str(), "abcdefghijklmnopqrstuvwxyz");
    }

    #[test]
    fn test_token_code_response_requires_nested_shape() {
        let ok: TokenCodeResponse =
            serde_json::from_value(json!({"data": {"token": {"token_code": "tc-1"}}})).unwrap();
        assert_eq!(ok.into_token_code(), Some(TokenCode::new("tc-1")));

        let missing: TokenCodeResponse =
            serde_json::from_value(json!({"data": {"token": {}}})).unwrap();
        assert_eq!(missing.into_token_code(), None);

        let flat: TokenCodeResponse =
            serde_json::from_value(json!({"token_code": "tc-1"})).unwrap();
        assert_eq!(flat.into_token_code(), None);
    }

    #[test]
    fn test_login_url_response_accepts_both_shapes() {
        let nested: LoginUrlResponse =
            serde_json::from_value(json!({"data": {"url": "https://idp/login?a=1"}})).unwrap();
        assert_eq!(nested.into_url().as_deref(), Some("https://idp/login?a=1"));

        let flat: LoginUrlResponse =
            serde_json::from_value(json!({"url": "https://idp/flat"})).unwrap();
        assert_eq!(flat.into_url().as_deref(), Some("https://idp/flat"));

        let neither: LoginUrlResponse = serde_json::from_value(json!({"data": {}})).unwrap();
        assert_eq!(neither.into_url(), None);
    }

    #[test]
    fn test_identity_prefers_nested_user() {
        let envelope: IdentityEnvelope = serde_json::from_value(json!({
            "code": 200,
            "data": {"user": {"id": 42, "email": "a@b.c", "name": "Ann"}, "id": "outer"}
        }))
        .unwrap();
        let identity = envelope.into_identity().unwrap();
        assert_eq!(identity.id, "42");
        assert_eq!(identity.email.as_deref(), Some("a@b.c"));
        assert_eq!(identity.name.as_deref(), Some("Ann"));
    }

    #[test]
    fn test_identity_falls_back_to_data_object() {
        let envelope: IdentityEnvelope = serde_json::from_value(json!({
            "code": 200,
            "data": {"userId": "u-7", "email": "x@y.z"}
        }))
        .unwrap();
        let identity = envelope.into_identity().unwrap();
        assert_eq!(identity.id, "u-7");
        assert_eq!(identity.name, None);
    }

    #[test]
    fn test_identity_requires_success_code_and_id() {
        let wrong_code: IdentityEnvelope =
            serde_json::from_value(json!({"code": 401, "data": {"id": "u"}})).unwrap();
        assert_eq!(wrong_code.into_identity(), None);

        let no_data: IdentityEnvelope = serde_json::from_value(json!({"code": 200})).unwrap();
        assert_eq!(no_data.into_identity(), None);

        let no_id: IdentityEnvelope =
            serde_json::from_value(json!({"code": 200, "data": {"email": "a@b.c"}})).unwrap();
        assert_eq!(no_id.into_identity(), None);
    }

    #[test]
    fn test_provider_error_body_parsing() {
        let nested = ProviderErrorBody::from_body(
            &json!({"error": {"code": 407, "message": "Please provide correct body value!"}}),
        );
        assert_eq!(nested.code, Some(VALUE_MISMATCH_CODE));
        assert_eq!(
            nested.message.as_deref(),
            Some("Please provide correct body value!")
        );

        let flat = ProviderErrorBody::from_body(&json!({"message": "nope"}));
        assert_eq!(flat.code, None);
        assert_eq!(flat.message.as_deref(), Some("nope"));

        let string_error = ProviderErrorBody::from_body(&json!({"error": "bad"}));
        assert_eq!(string_error.code, None);
    }
}
