//! Authentication API Endpoints
//!
//! Registration and login under /api/auth.

use crate::app::AppState;
use crate::auth::models::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use crate::auth::user_store::{hash_password, verify_password};
use crate::store::StoreError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{info, warn};

/// Register a new user - POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AuthApiError> {
    let password_hash = hash_password(&payload.password).map_err(|e| {
        warn!("Password hashing failed: {}", e);
        AuthApiError::InternalError
    })?;

    let user = state
        .users
        .create_user(&payload.username, &password_hash, payload.role)
        .map_err(|e| match e {
            StoreError::Conflict => {
                warn!("Registration failed: user {} already exists", payload.username);
                AuthApiError::UserAlreadyExists
            }
            StoreError::Database(e) => {
                warn!("Registration failed: {}", e);
                AuthApiError::InternalError
            }
        })?;

    info!("User registered successfully: {}", user.username);

    Ok(Json(RegisterResponse {
        username: user.username,
    }))
}

/// Login endpoint - POST /api/auth/login
///
/// Unknown username and wrong password both return the same generic error so
/// the response never reveals which usernames exist.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthApiError> {
    let user = state
        .users
        .get_user_by_username(&payload.username)
        .map_err(|e| {
            warn!("User lookup failed: {}", e);
            AuthApiError::InternalError
        })?;

    let user = match user {
        Some(user) if verify_password(&payload.password, &user.password_hash) => user,
        _ => {
            warn!("Login attempt failed for user: {}", payload.username);
            return Err(AuthApiError::InvalidCredentials);
        }
    };

    let (access_token, expires_in) = state.jwt.generate_token(&user).map_err(|e| {
        warn!("Token generation failed: {}", e);
        AuthApiError::InternalError
    })?;

    info!("User logged in successfully: {}", user.username);

    Ok(Json(LoginResponse {
        access_token,
        expires_in,
    }))
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    InvalidCredentials,
    UserAlreadyExists,
    InternalError,
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthApiError::InvalidCredentials => (StatusCode::BAD_REQUEST, "Invalid credentials"),
            AuthApiError::UserAlreadyExists => (StatusCode::BAD_REQUEST, "User already exists."),
            AuthApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}
