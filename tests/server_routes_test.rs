//! HTTP route tests
//!
//! Sends requests straight through the axum router with `oneshot`; the
//! provider is a `wiremock` server.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ssobridge::provider::UserIdentity;
use ssobridge::server;
use ssobridge::SessionIssuer;

use common::{auth_service, token_code_body, value_mismatch_body, SIGNING_SECRET};

const ORIGIN: &str = "https://lawlessjakarta.com";

fn app(server: &MockServer) -> Router {
    server::router(auth_service(server), "https://lawlessjakarta.com/").expect("router")
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let server = MockServer::start().await;

    let (status, body) = send(app(&server), get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_login_url_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_code_body()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/request-url"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"url": "https://allaccess.id/go"})),
        )
        .mount(&server)
        .await;

    let (status, body) = send(app(&server), get("/api/auth/login-url")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "loginUrl": "https://allaccess.id/go"})
    );
}

#[tokio::test]
async fn test_login_url_exhaustion_is_500() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_code_body()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/request-url"))
        .respond_with(ResponseTemplate::new(400).set_body_json(value_mismatch_body()))
        .mount(&server)
        .await;

    let (status, body) = send(app(&server), get("/api/auth/login-url")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Failed to generate login URL");
    assert!(body["troubleshooting"].is_object());
}

#[tokio::test]
async fn test_login_url_token_failure_is_500() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token/get"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (status, body) = send(app(&server), get("/api/auth/login-url")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "provider_auth_failed");
}

#[tokio::test]
async fn test_callback_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_code_body()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/exchange-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": {"user": {"id": "u-1", "email": "a@b.c", "name": "Ann"}}
        })))
        .mount(&server)
        .await;

    let (status, body) = send(
        app(&server),
        post_json("/api/auth/callback", json!({"code": "abc"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(
        body["user"],
        json!({"id": "u-1", "email": "a@b.c", "name": "Ann"})
    );

    let token = body["redirectToken"].as_str().expect("token");
    let user = SessionIssuer::new(SIGNING_SECRET).verify(token).unwrap();
    assert_eq!(user.id, "u-1");
}

#[tokio::test]
async fn test_callback_numeric_code_is_exchanged_as_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_code_body()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/exchange-code"))
        .and(body_partial_json(json!({"code": "123456"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": {"id": "u-2", "name": "Num"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(
        app(&server),
        post_json("/api/auth/callback", json!({"code": 123456})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], "u-2");
}

#[tokio::test]
async fn test_callback_malformed_json_is_reported() {
    let server = MockServer::start().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/callback")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"code\": "))
        .unwrap();

    let (status, body) = send(app(&server), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_request");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_callback_code_of_wrong_type_is_reported() {
    let server = MockServer::start().await;

    let (status, body) = send(
        app(&server),
        post_json("/api/auth/callback", json!({"code": true})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}

#[tokio::test]
async fn test_callback_without_fields_is_400() {
    let server = MockServer::start().await;

    let (status, body) = send(app(&server), post_json("/api/auth/callback", json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_callback_without_body_is_400() {
    let server = MockServer::start().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/callback")
        .body(Body::empty())
        .unwrap();

    let (status, _) = send(app(&server), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_rejected_user_is_401() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_code_body()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/check-data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 400})))
        .mount(&server)
        .await;

    let (status, body) = send(
        app(&server),
        post_json("/api/auth/callback", json!({"auth_data": "blob"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid authentication data");
}

#[tokio::test]
async fn test_verify_token_valid() {
    let server = MockServer::start().await;
    let token = SessionIssuer::new(SIGNING_SECRET)
        .issue(&UserIdentity {
            id: "u-5".to_string(),
            email: Some("five@example.com".to_string()),
            name: None,
        })
        .unwrap()
        .token;

    let (status, body) = send(
        app(&server),
        get(&format!("/api/auth/verify-token?token={}", token)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "valid": true,
            "user": {"userId": "u-5", "email": "five@example.com", "name": null}
        })
    );
}

#[tokio::test]
async fn test_verify_token_missing_is_400() {
    let server = MockServer::start().await;

    let (status, body) = send(app(&server), get("/api/auth/verify-token")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"valid": false, "error": "Missing token"}));
}

#[tokio::test]
async fn test_verify_token_bad_query_keeps_json_shape() {
    let server = MockServer::start().await;

    let (status, body) = send(
        app(&server),
        get("/api/auth/verify-token?token=a&token=b"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"valid": false, "error": "Invalid query string"}));
}

#[tokio::test]
async fn test_verify_token_foreign_signature_is_401() {
    let server = MockServer::start().await;
    let token = SessionIssuer::new("some-other-secret-some-other-secret")
        .issue(&UserIdentity {
            id: "u-5".to_string(),
            email: None,
            name: None,
        })
        .unwrap()
        .token;

    let (status, body) = send(
        app(&server),
        get(&format!("/api/auth/verify-token?token={}", token)),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({"valid": false, "error": "Invalid or expired token"})
    );
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let server = MockServer::start().await;
    let request = Request::builder()
        .uri("/api/health")
        .header(header::ORIGIN, ORIGIN)
        .body(Body::empty())
        .unwrap();

    let response = app(&server).oneshot(request).await.unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        ORIGIN
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );
}
