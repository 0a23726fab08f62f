//! ProjectHub Backend Library
//!
//! Exposes the application modules for use by the server binary and
//! the integration tests.

pub mod app;
pub mod auth;
pub mod middleware;
pub mod projects;
pub mod store;
