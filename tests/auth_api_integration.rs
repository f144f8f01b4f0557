//! Integration tests for the HTTP auth endpoints
//!
//! Each test builds the full router over an in-memory user store and drives
//! it with `tower::ServiceExt::oneshot`, so no socket is opened.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use graph_auth::auth::{AuthService, JwtHandler, MemoryUserStore};
use graph_auth::create_router;

fn test_app() -> Router {
    let service = AuthService::new(
        Arc::new(MemoryUserStore::new()),
        JwtHandler::new("integration-secret".to_string()),
    )
    .with_bcrypt_cost(4);
    create_router(Arc::new(service))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn register(email: &str, password: &str, name: &str) -> Request<Body> {
    post_json(
        "/api/auth/register",
        json!({ "email": email, "password": password, "name": name }),
    )
}

fn login(email: &str, password: &str) -> Request<Body> {
    post_json(
        "/api/auth/login",
        json!({ "email": email, "password": password }),
    )
}

fn me(token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri("/api/auth/me");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_register_then_login_flow() {
    let app = test_app();

    let (status, registered) = send(&app, register("a@x.com", "pw1", "Alice")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(registered["email"], "a@x.com");
    assert_eq!(registered["name"], "Alice");
    assert!(registered["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(registered.get("password").is_none());

    let (status, logged_in) = send(&app, login("a@x.com", "pw1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logged_in["userId"], registered["userId"]);
}

#[tokio::test]
async fn test_duplicate_registration_is_422() {
    let app = test_app();
    send(&app, register("a@x.com", "pw1", "Alice")).await;

    let (status, body) = send(&app, register("a@x.com", "pw2", "Bob")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "ValidationError");
    assert_eq!(
        body["message"],
        "An account already exists with the email address"
    );
    assert_eq!(body["details"]["email"], "Email address already taken");
}

#[tokio::test]
async fn test_login_failures_name_the_field() {
    let app = test_app();
    send(&app, register("a@x.com", "pw1", "Alice")).await;

    let (status, body) = send(&app, login("a@x.com", "wrong")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["password"], "Incorrect password");

    let (status, body) = send(&app, login("nobody@x.com", "pw1")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["email"], "Incorrect email");
}

#[tokio::test]
async fn test_bad_request_bodies_use_validation_shape() {
    let app = test_app();

    // Not JSON at all
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");
    assert_eq!(body["message"], "Invalid request body");
    assert!(body["details"]["body"].is_string());

    // Well-formed JSON missing `password`
    let (status, body) = send(
        &app,
        post_json("/api/auth/login", json!({ "email": "a@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "ValidationError");
    assert!(body["details"]["body"].is_string());

    // No JSON content type
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .body(Body::from(r#"{"email":"a@x.com","password":"pw"}"#))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"], "ValidationError");
}

#[tokio::test]
async fn test_me_requires_valid_token() {
    let app = test_app();

    let (status, _) = send(&app, me(None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, me(Some("not.a.token"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, registered) = send(&app, register("a@x.com", "pw1", "Alice")).await;
    let token = registered["token"].as_str().unwrap();

    let (status, body) = send(&app, me(Some(token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], registered["userId"]);
    assert_eq!(body["name"], "Alice");
}

#[tokio::test]
async fn test_token_from_other_secret_is_rejected() {
    let app = test_app();
    let foreign = JwtHandler::new("some-other-secret".to_string())
        .sign("u-1", &serde_json::Map::new())
        .unwrap();

    let (status, _) = send(&app, me(Some(&foreign))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
