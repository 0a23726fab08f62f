//! Project Models
//!
//! One canonical record plus an explicit per-role projection, so the
//! full-vs-reduced response split is testable without going through HTTP.

use crate::auth::models::UserRole;
use serde::{Deserialize, Serialize};

/// Canonical project record as stored.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// Request body for create and full-replace update.
#[derive(Debug, Deserialize)]
pub struct ProjectPayload {
    pub name: String,
    pub description: String,
}

impl ProjectPayload {
    /// Both fields must be present and non-blank.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && !self.description.trim().is_empty()
    }
}

/// Role-shaped view of a project.
///
/// Admins see the full record; everyone else gets the reduced view
/// without the identifier.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ProjectView {
    Full(Project),
    Reduced { name: String, description: String },
}

/// Project the canonical record for the given caller role.
pub fn project_view(project: Project, role: UserRole) -> ProjectView {
    if role.is_admin() {
        ProjectView::Full(project)
    } else {
        ProjectView::Reduced {
            name: project.name,
            description: project.description,
        }
    }
}
