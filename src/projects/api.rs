//! Project API Endpoints
//!
//! CRUD under /api/projects. All routes sit behind the auth middleware;
//! mutations additionally require the admin role, and that check runs
//! before the existence check so 403 beats 404 for mutating calls.

use crate::app::AppState;
use crate::auth::middleware::CurrentUser;
use crate::projects::models::{project_view, Project, ProjectPayload, ProjectView};
use crate::store::StoreError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;
use tracing::{info, warn};

/// Create a new project - POST /api/projects/
pub async fn create_project(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<ProjectPayload>,
) -> Result<Json<Project>, ProjectApiError> {
    if !user.role.is_admin() {
        return Err(ProjectApiError::Forbidden);
    }

    if !payload.is_valid() {
        return Err(ProjectApiError::InvalidPayload);
    }

    info!("Creating project: {}", payload.name);

    let project = state
        .projects
        .create(&payload.name, &payload.description)
        .map_err(ProjectApiError::from_store("Project creation failed"))?;

    Ok(Json(project))
}

/// Get a specific project - GET /api/projects/:id
pub async fn get_project(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_id): Path<i64>,
) -> Result<Json<ProjectView>, ProjectApiError> {
    let project = state
        .projects
        .get(project_id)
        .map_err(ProjectApiError::from_store("Project lookup failed"))?
        .ok_or(ProjectApiError::NotFound)?;

    Ok(Json(project_view(project, user.role)))
}

/// List all projects - GET /api/projects/
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<ProjectView>>, ProjectApiError> {
    let projects = state
        .projects
        .list()
        .map_err(ProjectApiError::from_store("Project listing failed"))?;

    let views = projects
        .into_iter()
        .map(|p| project_view(p, user.role))
        .collect();

    Ok(Json(views))
}

/// Update an existing project - PUT /api/projects/:id
///
/// The permission check deliberately precedes the existence check, so a
/// non-admin gets 403 even for an unknown id.
pub async fn update_project(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_id): Path<i64>,
    Json(payload): Json<ProjectPayload>,
) -> Result<Json<Project>, ProjectApiError> {
    if !user.role.is_admin() {
        return Err(ProjectApiError::Forbidden);
    }

    if !payload.is_valid() {
        return Err(ProjectApiError::InvalidPayload);
    }

    let project = state
        .projects
        .update(project_id, &payload.name, &payload.description)
        .map_err(ProjectApiError::from_store("Project update failed"))?
        .ok_or(ProjectApiError::NotFound)?;

    Ok(Json(project))
}

/// Delete a project - DELETE /api/projects/:id
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ProjectApiError> {
    if !user.role.is_admin() {
        return Err(ProjectApiError::Forbidden);
    }

    let deleted = state
        .projects
        .delete(project_id)
        .map_err(ProjectApiError::from_store("Project deletion failed"))?;

    if !deleted {
        warn!("Project with id {} not found for deletion", project_id);
        return Err(ProjectApiError::NotFound);
    }

    Ok(Json(json!({ "detail": "Project deleted successfully" })))
}

/// Project API errors
#[derive(Debug)]
pub enum ProjectApiError {
    Forbidden,
    NotFound,
    DuplicateName,
    InvalidPayload,
    InternalError,
}

impl ProjectApiError {
    /// Translate a store error at the handler boundary.
    fn from_store(context: &'static str) -> impl Fn(StoreError) -> ProjectApiError {
        move |e| match e {
            StoreError::Conflict => {
                warn!("{}: project with this name already exists", context);
                ProjectApiError::DuplicateName
            }
            StoreError::Database(e) => {
                warn!("{}: {}", context, e);
                ProjectApiError::InternalError
            }
        }
    }
}

impl IntoResponse for ProjectApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ProjectApiError::Forbidden => (StatusCode::FORBIDDEN, "Not enough permissions"),
            ProjectApiError::NotFound => (StatusCode::NOT_FOUND, "Project not found"),
            ProjectApiError::DuplicateName => (
                StatusCode::BAD_REQUEST,
                "Project with this name already exists.",
            ),
            ProjectApiError::InvalidPayload => (
                StatusCode::BAD_REQUEST,
                "name and description are required",
            ),
            ProjectApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}
