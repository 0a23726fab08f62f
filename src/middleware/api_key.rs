//! API-key gate middleware.
//!
//! Every request must present the configured shared secret in the
//! `x-api-key` header. This runs before rate limiting and routing, so a
//! request with a bad key never touches route-specific logic.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Configured API key, shared with the middleware as state.
#[derive(Clone)]
pub struct ApiKeyGate {
    expected: String,
}

impl ApiKeyGate {
    pub fn new(expected: String) -> Self {
        Self { expected }
    }

    fn matches(&self, presented: Option<&str>) -> bool {
        presented == Some(self.expected.as_str())
    }
}

/// Middleware that rejects requests without a valid API key.
pub async fn require_api_key(
    State(gate): State<ApiKeyGate>,
    req: Request,
    next: Next,
) -> Response {
    let presented = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok());

    if !gate.matches(presented) {
        warn!(path = %req.uri().path(), "Rejected request with missing or invalid API key");
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "detail": "Invalid or missing API key" })),
        )
            .into_response();
    }

    next.run(req).await
}
