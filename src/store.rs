//! Shared persistence error type.
//!
//! Both stores translate rusqlite failures here so handlers can map
//! uniqueness violations to a structured conflict instead of leaking a
//! raw storage error.

use rusqlite::ErrorCode;

/// Errors surfaced by the SQLite-backed stores.
#[derive(Debug)]
pub enum StoreError {
    /// A UNIQUE constraint was violated (duplicate username or project name).
    Conflict,
    /// Any other storage failure.
    Database(rusqlite::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(e, _) = &err {
            if e.code == ErrorCode::ConstraintViolation {
                return StoreError::Conflict;
            }
        }
        StoreError::Database(err)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Conflict => write!(f, "uniqueness constraint violated"),
            StoreError::Database(e) => write!(f, "database error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}
