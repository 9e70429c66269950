//! Project API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use recap_core::{cache::keys, FileRef, NewProject, Project, ProjectError};

use super::middleware::AuthUser;
use crate::state::AppState;

/// Error response body shared by the project handlers.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub(super) fn error_body(message: impl Into<String>) -> Json<ErrorResponse> {
    Json(ErrorResponse {
        error: message.into(),
    })
}

fn map_project_error(err: ProjectError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        ProjectError::NotFound(_) => StatusCode::NOT_FOUND,
        ProjectError::AlreadySet { .. } => StatusCode::CONFLICT,
        ProjectError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error_body(err.to_string()))
}

/// Load a project and confirm the requester owns it. A foreign project is
/// indistinguishable from a missing one.
pub(super) fn owned_project(
    state: &AppState,
    id: &str,
    user_id: &str,
) -> Result<Project, (StatusCode, Json<ErrorResponse>)> {
    match state.projects().get(id) {
        Ok(Some(project)) if project.user_id == user_id => Ok(project),
        Ok(_) => Err((
            StatusCode::NOT_FOUND,
            error_body(format!("project not found: {}", id)),
        )),
        Err(e) => Err(map_project_error(e)),
    }
}

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateProjectBody {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectBody {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// One monotonic file registration. Each variant is written exactly once
/// per project; a second registration is a conflict.
#[derive(Debug, Deserialize)]
#[serde(tag = "slot", rename_all = "snake_case")]
pub enum RegisterFileBody {
    Origin { file: FileRef },
    Transcription { file_id: String },
    Summary { file_id: String },
    Frames,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn create_project(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateProjectBody>,
) -> Result<(StatusCode, Json<Project>), (StatusCode, Json<ErrorResponse>)> {
    let project = state
        .projects()
        .create(NewProject {
            user_id,
            name: body.name,
            description: body.description,
        })
        .map_err(map_project_error)?;

    info!(project_id = %project.id, "project created");
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Project>>, (StatusCode, Json<ErrorResponse>)> {
    state
        .projects()
        .list_by_user(&user_id)
        .map(Json)
        .map_err(map_project_error)
}

pub async fn get_project(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Project>, (StatusCode, Json<ErrorResponse>)> {
    owned_project(&state, &id, &user_id).map(Json)
}

/// Update name/description and bump the project-changed marker with the
/// editor's id, so other viewers' streams re-read the project while the
/// editor's own stream suppresses the echo.
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateProjectBody>,
) -> Result<Json<Project>, (StatusCode, Json<ErrorResponse>)> {
    owned_project(&state, &id, &user_id)?;

    state
        .projects()
        .update(&id, &body.name, &body.description)
        .map_err(map_project_error)?;

    state
        .cache()
        .set(&keys::project_changed(&id), &user_id, state.status_ttl())
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body(e.to_string()),
            )
        })?;

    owned_project(&state, &id, &user_id).map(Json)
}

pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    owned_project(&state, &id, &user_id)?;

    state.tasks().delete_by_project(&id).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_body(e.to_string()),
        )
    })?;
    state.projects().delete(&id).map_err(map_project_error)?;

    info!(project_id = %id, "project deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn register_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<RegisterFileBody>,
) -> Result<Json<Project>, (StatusCode, Json<ErrorResponse>)> {
    owned_project(&state, &id, &user_id)?;

    let result = match &body {
        RegisterFileBody::Origin { file } => state.projects().set_origin_file(&id, file),
        RegisterFileBody::Transcription { file_id } => {
            state.projects().set_transcription_file(&id, file_id)
        }
        RegisterFileBody::Summary { file_id } => state.projects().set_summary_file(&id, file_id),
        RegisterFileBody::Frames => state.projects().set_frames_extracted(&id),
    };
    result.map_err(map_project_error)?;

    owned_project(&state, &id, &user_id).map(Json)
}
