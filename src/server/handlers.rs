//! Route handlers.
//!
//! Handlers only translate between HTTP and [`AuthService`]; all decisions
//! live in the service.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{AuthError, AuthService, CallbackRequest};
use crate::provider::IdentityProvider;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LoginUrlBody {
    success: bool,
    login_url: String,
}

pub(super) async fn login_url<P: IdentityProvider>(
    State(service): State<Arc<AuthService<P>>>,
) -> Result<Json<LoginUrlBody>, AuthError> {
    let login = service.login_url().await?;
    Ok(Json(LoginUrlBody {
        success: true,
        login_url: login.url,
    }))
}

#[derive(Debug, Serialize)]
pub(super) struct CallbackUser {
    id: String,
    email: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CallbackBody {
    success: bool,
    redirect_token: String,
    user: CallbackUser,
}

/// A request without a JSON body is treated as empty, so the caller gets
/// the same 400 as for a body without either field. A body that is present
/// but malformed gets its own 400.
pub(super) async fn callback<P: IdentityProvider>(
    State(service): State<Arc<AuthService<P>>>,
    body: Result<Json<CallbackRequest>, JsonRejection>,
) -> Result<Json<CallbackBody>, AuthError> {
    let request = match body {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => CallbackRequest::default(),
        Err(rejection) => {
            return Err(AuthError::InvalidRequest(format!(
                "Invalid request body: {}",
                rejection.body_text()
            )))
        }
    };
    let outcome = service.callback(request).await?;

    Ok(Json(CallbackBody {
        success: true,
        redirect_token: outcome.session.token,
        user: CallbackUser {
            id: outcome.user.id,
            email: outcome.user.email,
            name: outcome.user.name,
        },
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct VerifyParams {
    #[serde(default)]
    token: Option<String>,
}

pub(super) async fn verify_token<P: IdentityProvider>(
    State(service): State<Arc<AuthService<P>>>,
    params: Result<Query<VerifyParams>, QueryRejection>,
) -> Response {
    let token = match params {
        Ok(Query(params)) => params.token.unwrap_or_default(),
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Rejected verify query");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"valid": false, "error": "Invalid query string"})),
            )
                .into_response();
        }
    };

    match service.verify(&token) {
        Ok(user) => Json(json!({
            "valid": true,
            "user": {
                "userId": user.id,
                "email": user.email,
                "name": user.name,
            }
        }))
        .into_response(),
        Err(AuthError::InvalidRequest(_)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"valid": false, "error": "Missing token"})),
        )
            .into_response(),
        Err(e) => {
            tracing::debug!(error = ?e, "Session token rejected");
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"valid": false, "error": "Invalid or expired token"})),
            )
                .into_response()
        }
    }
}

pub(super) async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
