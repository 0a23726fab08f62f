//! Authentication Module
//!
//! JWT issuance and validation, bcrypt password handling, user storage,
//! and the identity-resolution middleware for protected routes.

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod user_store;

pub use jwt::JwtHandler;
pub use middleware::auth_middleware;
pub use user_store::UserStore;
