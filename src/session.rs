//! Session tokens handed to the partner site after a successful login.
//!
//! Tokens are HS256 JWTs signed with the configured secret. They carry the
//! minimal identity claims plus `iat`/`exp` and live for fifteen minutes.
//! Verification is local: signature and expiry only, no server-side state.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SessionConfig;
use crate::error::{Result, SsoError};
use crate::provider::UserIdentity;

/// Lifetime of every session token.
pub const SESSION_TTL_MINUTES: i64 = 15;

/// Session token failures.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Signature mismatch, malformed token, or elapsed expiry.
    #[error("Invalid or expired token: {0}")]
    InvalidOrExpired(String),

    /// The claims could not be signed.
    #[error("Failed to sign session token: {0}")]
    Signing(String),
}

/// Claims embedded in a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the provider user identifier
    pub sub: String,
    /// Provider user identifier, kept for partner sites reading `userId`
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Always `true`: the provider validated this user
    pub verified: bool,
    /// Issue time in milliseconds since the epoch
    pub timestamp: i64,
    /// Issued at (seconds since the epoch)
    pub iat: i64,
    /// Expiry (seconds since the epoch)
    pub exp: i64,
}

impl SessionClaims {
    /// Identity projection of the claims.
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            id: self.user_id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }

    /// Expiry as a timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// A freshly signed session token.
#[derive(Debug, Clone)]
pub struct SessionToken {
    /// Compact JWT
    pub token: String,
    /// When the token stops verifying
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies session tokens with a single shared secret.
#[derive(Clone)]
pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionIssuer {
    /// Creates an issuer for the given HMAC secret.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(SESSION_TTL_MINUTES),
        }
    }

    /// Creates an issuer from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SsoError::MissingConfig`] if no signing secret is set.
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        if config.signing_secret.is_empty() {
            return Err(SsoError::MissingConfig("JWT_SECRET".to_string()).into());
        }
        Ok(Self::new(&config.signing_secret))
    }

    /// Issues a token for `identity`, valid from now for fifteen minutes.
    pub fn issue(&self, identity: &UserIdentity) -> std::result::Result<SessionToken, SessionError> {
        self.issue_at(identity, Utc::now())
    }

    /// Issues a token as if the current time were `issued_at`.
    pub fn issue_at(
        &self,
        identity: &UserIdentity,
        issued_at: DateTime<Utc>,
    ) -> std::result::Result<SessionToken, SessionError> {
        let expires_at = issued_at + self.ttl;
        let claims = SessionClaims {
            sub: identity.id.clone(),
            user_id: identity.id.clone(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            verified: true,
            timestamp: issued_at.timestamp_millis(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| SessionError::Signing(e.to_string()))?;

        Ok(SessionToken { token, expires_at })
    }

    /// Decodes and validates a token, returning all of its claims.
    pub fn decode(&self, token: &str) -> std::result::Result<SessionClaims, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256];
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;

        let data = decode::<SessionClaims>(token, &self.decoding, &validation)
            .map_err(|e| SessionError::InvalidOrExpired(e.to_string()))?;

        if !data.claims.verified {
            return Err(SessionError::InvalidOrExpired(
                "token is not marked verified".to_string(),
            ));
        }
        Ok(data.claims)
    }

    /// Verifies a token and returns the identity it carries.
    pub fn verify(&self, token: &str) -> std::result::Result<UserIdentity, SessionError> {
        self.decode(token).map(|claims| claims.identity())
    }
}
