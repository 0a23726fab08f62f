//! Projects Module
//!
//! The project resource: models with per-role projections, SQLite store,
//! and the CRUD endpoints under /api/projects.

pub mod api;
pub mod models;
pub mod store;

pub use store::ProjectStore;
