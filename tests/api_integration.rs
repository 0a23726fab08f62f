//! Integration tests for the HTTP surface.
//!
//! Drives the full router (API-key gate, rate limiter, auth middleware,
//! handlers) through `tower::ServiceExt::oneshot` against a temporary
//! SQLite database.

use axum::body::Body;
use axum::extract::connect_info::ConnectInfo;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use projecthub_backend::app::{build_router, AppConfig, AppState};
use projecthub_backend::auth::{JwtHandler, UserStore};
use projecthub_backend::middleware::{RateLimitConfig, RateLimitLayer};
use projecthub_backend::projects::ProjectStore;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tower::ServiceExt;

const API_KEY: &str = "test-api-key";
const JWT_SECRET: &str = "test-secret-key-12345";

struct TestApp {
    router: Router,
    jwt: Arc<JwtHandler>,
    db_path: String,
    _db: NamedTempFile,
}

fn test_app() -> TestApp {
    // Ceiling high enough that only the dedicated tests hit it.
    test_app_with_rate_limit(RateLimitConfig {
        max_requests: 10_000,
        window: Duration::from_secs(60),
    })
}

fn test_app_with_rate_limit(rate_limit: RateLimitConfig) -> TestApp {
    let db = NamedTempFile::new().unwrap();
    let db_path = db.path().to_str().unwrap().to_string();

    let state = AppState {
        users: Arc::new(UserStore::new(&db_path).unwrap()),
        projects: Arc::new(ProjectStore::new(&db_path).unwrap()),
        jwt: Arc::new(JwtHandler::new(JWT_SECRET.to_string())),
    };
    let jwt = state.jwt.clone();

    let config = AppConfig {
        api_key: API_KEY.to_string(),
        allowed_origins: vec!["*".to_string()],
        rate_limit: rate_limit.clone(),
    };
    let limiter = RateLimitLayer::new(rate_limit);

    TestApp {
        router: build_router(state, &config, limiter),
        jwt,
        db_path,
        _db: db,
    }
}

/// Send a request through the router, returning status and parsed JSON body.
async fn send(
    router: &Router,
    method: Method,
    path: &str,
    api_key: Option<&str>,
    token: Option<&str>,
    body: Option<Value>,
    client_ip: &str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);

    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let mut request = request;
    let addr: SocketAddr = format!("{client_ip}:40000").parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

async fn register(app: &TestApp, username: &str, password: &str, role: &str) -> (StatusCode, Value) {
    send(
        &app.router,
        Method::POST,
        "/api/auth/register",
        Some(API_KEY),
        None,
        Some(json!({ "username": username, "password": password, "role": role })),
        "127.0.0.1",
    )
    .await
}

async fn login(app: &TestApp, username: &str, password: &str) -> (StatusCode, Value) {
    send(
        &app.router,
        Method::POST,
        "/api/auth/login",
        Some(API_KEY),
        None,
        Some(json!({ "username": username, "password": password })),
        "127.0.0.1",
    )
    .await
}

/// Register + login, returning a bearer token.
async fn token_for(app: &TestApp, username: &str, role: &str) -> String {
    let (status, _) = register(app, username, "password123", role).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = login(app, username, "password123").await;
    assert_eq!(status, StatusCode::OK);
    body["access_token"].as_str().unwrap().to_string()
}

async fn create_project(app: &TestApp, token: &str, name: &str, description: &str) -> (StatusCode, Value) {
    send(
        &app.router,
        Method::POST,
        "/api/projects/",
        Some(API_KEY),
        Some(token),
        Some(json!({ "name": name, "description": description })),
        "127.0.0.1",
    )
    .await
}

#[tokio::test]
async fn test_register_then_login_round_trip() {
    let app = test_app();

    let (status, body) = register(&app, "alice", "password123", "admin").await;
    assert_eq!(status, StatusCode::OK);
    // Public profile only: username, never the hash
    assert_eq!(body, json!({ "username": "alice" }));

    let (status, body) = login(&app, "alice", "password123").await;
    assert_eq!(status, StatusCode::OK);

    // The token embeds the registered role
    let claims = app
        .jwt
        .validate_token(body["access_token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.sub, "alice");
    assert_eq!(claims.role.as_str(), "admin");
}

#[tokio::test]
async fn test_duplicate_registration_is_conflict() {
    let app = test_app();

    let (status, _) = register(&app, "alice", "password123", "user").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = register(&app, "alice", "otherpassword", "admin").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "User already exists.");

    // Exactly one user record survived
    let conn = rusqlite::Connection::open(&app.db_path).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = test_app();
    register(&app, "alice", "password123", "user").await;

    let wrong_password = login(&app, "alice", "wrongpassword").await;
    let unknown_user = login(&app, "nobody", "password123").await;

    assert_eq!(wrong_password.0, StatusCode::BAD_REQUEST);
    // Identical status and payload for both failure causes
    assert_eq!(wrong_password, unknown_user);
    assert_eq!(wrong_password.1["detail"], "Invalid credentials");
}

#[tokio::test]
async fn test_requests_without_api_key_are_rejected() {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        Method::GET,
        "/health",
        None,
        None,
        None,
        "127.0.0.1",
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Invalid or missing API key");

    let (status, _) = send(
        &app.router,
        Method::GET,
        "/health",
        Some("wrong-key"),
        None,
        None,
        "127.0.0.1",
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app.router,
        Method::GET,
        "/health",
        Some(API_KEY),
        None,
        None,
        "127.0.0.1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_protected_routes_require_valid_token() {
    let app = test_app();

    let (status, _) = send(
        &app.router,
        Method::GET,
        "/api/projects/",
        Some(API_KEY),
        None,
        None,
        "127.0.0.1",
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app.router,
        Method::GET,
        "/api/projects/",
        Some(API_KEY),
        Some("not.a.token"),
        None,
        "127.0.0.1",
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_admin_can_read_but_never_mutate() {
    let app = test_app();
    let admin = token_for(&app, "root", "admin").await;
    let user = token_for(&app, "alice", "user").await;

    let (status, created) = create_project(&app, &admin, "apollo", "lunar program").await;
    assert_eq!(status, StatusCode::OK);
    let id = created["id"].as_i64().unwrap();

    // Reads succeed with the reduced shape
    let (status, body) = send(
        &app.router,
        Method::GET,
        &format!("/api/projects/{id}"),
        Some(API_KEY),
        Some(&user),
        None,
        "127.0.0.1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("id").is_none());
    assert_eq!(body["name"], "apollo");

    let (status, body) = send(
        &app.router,
        Method::GET,
        "/api/projects/",
        Some(API_KEY),
        Some(&user),
        None,
        "127.0.0.1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body[0].get("id").is_none());

    // All three mutating calls are 403 regardless of payload validity
    let (status, body) = create_project(&app, &user, "gemini", "two-seater").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Not enough permissions");

    let (status, _) = send(
        &app.router,
        Method::PUT,
        &format!("/api/projects/{id}"),
        Some(API_KEY),
        Some(&user),
        Some(json!({ "name": "renamed", "description": "changed" })),
        "127.0.0.1",
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app.router,
        Method::DELETE,
        &format!("/api/projects/{id}"),
        Some(API_KEY),
        Some(&user),
        None,
        "127.0.0.1",
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_sees_full_record() {
    let app = test_app();
    let admin = token_for(&app, "root", "admin").await;

    let (_, created) = create_project(&app, &admin, "apollo", "lunar program").await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = send(
        &app.router,
        Method::GET,
        &format!("/api/projects/{id}"),
        Some(API_KEY),
        Some(&admin),
        None,
        "127.0.0.1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"].as_i64(), Some(id));

    let (status, body) = send(
        &app.router,
        Method::GET,
        "/api/projects/",
        Some(API_KEY),
        Some(&admin),
        None,
        "127.0.0.1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"].as_i64(), Some(id));
}

#[tokio::test]
async fn test_duplicate_project_name_is_conflict() {
    let app = test_app();
    let admin = token_for(&app, "root", "admin").await;

    let (status, _) = create_project(&app, &admin, "apollo", "lunar program").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = create_project(&app, &admin, "apollo", "different description").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Project with this name already exists.");

    let conn = rusqlite::Connection::open(&app.db_path).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM projects", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_update_permission_precedes_existence() {
    let app = test_app();
    let admin = token_for(&app, "root", "admin").await;
    let user = token_for(&app, "alice", "user").await;

    // Non-admin gets 403 even for an id that does not exist
    let (status, _) = send(
        &app.router,
        Method::PUT,
        "/api/projects/9999",
        Some(API_KEY),
        Some(&user),
        Some(json!({ "name": "x", "description": "y" })),
        "127.0.0.1",
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin on the same id gets the 404
    let (status, body) = send(
        &app.router,
        Method::PUT,
        "/api/projects/9999",
        Some(API_KEY),
        Some(&admin),
        Some(json!({ "name": "x", "description": "y" })),
        "127.0.0.1",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Project not found");
}

#[tokio::test]
async fn test_update_replaces_record() {
    let app = test_app();
    let admin = token_for(&app, "root", "admin").await;

    let (_, created) = create_project(&app, &admin, "apollo", "lunar program").await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = send(
        &app.router,
        Method::PUT,
        &format!("/api/projects/{id}"),
        Some(API_KEY),
        Some(&admin),
        Some(json!({ "name": "apollo-11", "description": "first landing" })),
        "127.0.0.1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "apollo-11");
    assert_eq!(body["description"], "first landing");
}

#[tokio::test]
async fn test_double_delete_yields_not_found() {
    let app = test_app();
    let admin = token_for(&app, "root", "admin").await;

    let (_, created) = create_project(&app, &admin, "apollo", "lunar program").await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = send(
        &app.router,
        Method::DELETE,
        &format!("/api/projects/{id}"),
        Some(API_KEY),
        Some(&admin),
        None,
        "127.0.0.1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "Project deleted successfully");

    let (status, _) = send(
        &app.router,
        Method::DELETE,
        &format!("/api/projects/{id}"),
        Some(API_KEY),
        Some(&admin),
        None,
        "127.0.0.1",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_project_is_not_found() {
    let app = test_app();
    let user = token_for(&app, "alice", "user").await;

    let (status, _) = send(
        &app.router,
        Method::GET,
        "/api/projects/9999",
        Some(API_KEY),
        Some(&user),
        None,
        "127.0.0.1",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_blank_fields_rejected() {
    let app = test_app();
    let admin = token_for(&app, "root", "admin").await;

    let (status, body) = create_project(&app, &admin, "   ", "lunar program").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "name and description are required");
}

#[tokio::test]
async fn test_rate_limit_enforced_per_address() {
    let app = test_app_with_rate_limit(RateLimitConfig {
        max_requests: 5,
        window: Duration::from_millis(400),
    });

    for _ in 0..5 {
        let (status, _) = send(
            &app.router,
            Method::GET,
            "/health",
            Some(API_KEY),
            None,
            None,
            "10.1.1.1",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    // 6th request within the window is rejected
    let (status, body) = send(
        &app.router,
        Method::GET,
        "/health",
        Some(API_KEY),
        None,
        None,
        "10.1.1.1",
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["detail"], "Rate limit exceeded. Try again later.");

    // A different client address is unaffected
    let (status, _) = send(
        &app.router,
        Method::GET,
        "/health",
        Some(API_KEY),
        None,
        None,
        "10.1.1.2",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // After the window elapses the original client succeeds again
    tokio::time::sleep(Duration::from_millis(500)).await;
    let (status, _) = send(
        &app.router,
        Method::GET,
        "/health",
        Some(API_KEY),
        None,
        None,
        "10.1.1.1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
