//! Authentication Middleware
//!
//! Resolves the caller's identity for protected routes: validates the bearer
//! token, then confirms the subject still exists in the user store. Handlers
//! downstream read the resolved user from request extensions.

use crate::app::AppState;
use crate::auth::models::User;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

/// The authenticated user for the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Auth middleware that validates JWT tokens and resolves the user
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingToken)?;

    let claims = state
        .jwt
        .validate_token(token)
        .map_err(|_| AuthError::InvalidToken)?;

    // The subject must still exist; a token for a deleted account is useless.
    let user = state
        .users
        .get_user_by_username(&claims.sub)
        .map_err(|e| {
            warn!("User lookup failed during auth: {}", e);
            AuthError::LookupFailed
        })?
        .ok_or(AuthError::UnknownSubject)?;

    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}

/// Auth error types
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    UnknownSubject,
    LookupFailed,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing authorization token"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            AuthError::UnknownSubject => (StatusCode::UNAUTHORIZED, "User no longer exists"),
            AuthError::LookupFailed => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}
