//! Middleware for the request gate and observability.
//!
//! This module provides:
//! - Static API-key enforcement for every request
//! - Rate limiting per IP address
//! - Request logging with latency tracking

pub mod api_key;
pub mod logging;
pub mod rate_limit;

pub use api_key::{require_api_key, ApiKeyGate};
pub use logging::request_logging;
pub use rate_limit::{RateLimitConfig, RateLimitLayer};
