//! Application state and router assembly.
//!
//! The middleware stack enforces the request gate in order: API key first,
//! then rate limiting, then routing; protected routes additionally resolve
//! the caller's identity before the handler runs.

use crate::auth::{api as auth_api, auth_middleware, JwtHandler, UserStore};
use crate::middleware::rate_limit::rate_limit_middleware;
use crate::middleware::{require_api_key, request_logging, ApiKeyGate, RateLimitLayer};
use crate::projects::{api as projects_api, ProjectStore};
use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserStore>,
    pub projects: Arc<ProjectStore>,
    pub jwt: Arc<JwtHandler>,
}

/// Server configuration resolved from the environment.
pub struct AppConfig {
    pub api_key: String,
    pub allowed_origins: Vec<String>,
    pub rate_limit: crate::middleware::RateLimitConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: "dev-api-key".to_string(),
            allowed_origins: vec!["*".to_string()],
            rate_limit: crate::middleware::RateLimitConfig {
                max_requests: 5,
                window: Duration::from_secs(60),
            },
        }
    }
}

/// Health check - GET /health
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn build_cors(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the full application router.
///
/// The limiter is injected so the binary can share it with a background
/// cleanup task and tests can shrink the window.
pub fn build_router(state: AppState, config: &AppConfig, limiter: RateLimitLayer) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/register", post(auth_api::register))
        .route("/api/auth/login", post(auth_api::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route(
            "/api/projects/",
            post(projects_api::create_project).get(projects_api::list_projects),
        )
        .route(
            "/api/projects/:id",
            get(projects_api::get_project)
                .put(projects_api::update_project)
                .delete(projects_api::delete_project),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state);

    let public_routes = Router::new().route("/health", get(health_check));

    // Layers run outermost-last: CORS, then API key, then rate limit.
    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(request_logging))
        .layer(middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            ApiKeyGate::new(config.api_key.clone()),
            require_api_key,
        ))
        .layer(build_cors(&config.allowed_origins))
}
