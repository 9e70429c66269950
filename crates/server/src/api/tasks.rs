//! Task submission and listing handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, warn};

use recap_core::{AdmissionError, CreateTaskRequest, OrchestratorError, Task};

use super::middleware::AuthUser;
use super::projects::{error_body, owned_project, ErrorResponse};
use crate::metrics::{TASKS_CREATED_TOTAL, TASK_REJECTIONS_TOTAL};
use crate::state::AppState;

fn rejection_label(reason: &AdmissionError) -> &'static str {
    match reason {
        AdmissionError::NoOriginFile => "no_origin_file",
        AdmissionError::ProjectBusy => "project_busy",
        AdmissionError::OnlyFramesExtractAfterTranscribe
        | AdmissionError::OnlyTranscribeAfterFramesExtract => "extraction_window",
        AdmissionError::AlreadyTranscribed => "already_transcribed",
        AdmissionError::FramesAlreadyExtracted => "frames_already_extracted",
        AdmissionError::OriginFileIsAudio => "origin_is_audio",
        AdmissionError::ProjectHasUnfinishedTasks => "unfinished_tasks",
    }
}

fn map_orchestrator_error(err: OrchestratorError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        // Preconditions failed; nothing was persisted or dispatched.
        OrchestratorError::Admission(_) => StatusCode::CONFLICT,
        // Rows committed but the queue refused the order.
        OrchestratorError::Dispatch(_) => StatusCode::BAD_GATEWAY,
        OrchestratorError::UnknownTask(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error_body(err.to_string()))
}

pub async fn create_task(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), (StatusCode, Json<ErrorResponse>)> {
    let project = owned_project(&state, &id, &user_id)?;
    let kind = request.kind;

    match state
        .orchestrator()
        .create_task(&project, &user_id, request)
        .await
    {
        Ok(task) => {
            TASKS_CREATED_TOTAL
                .with_label_values(&[kind.as_str()])
                .inc();
            info!(task_id = %task.id, project_id = %id, kind = %kind.as_str(), "task created");
            Ok((StatusCode::CREATED, Json(task)))
        }
        Err(OrchestratorError::Admission(reason)) => {
            TASK_REJECTIONS_TOTAL
                .with_label_values(&[rejection_label(&reason)])
                .inc();
            info!(project_id = %id, kind = %kind.as_str(), %reason, "task rejected");
            Err(map_orchestrator_error(OrchestratorError::Admission(reason)))
        }
        Err(e) => {
            warn!(project_id = %id, kind = %kind.as_str(), error = %e, "task creation failed");
            Err(map_orchestrator_error(e))
        }
    }
}

pub async fn list_active_tasks(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<Task>>, (StatusCode, Json<ErrorResponse>)> {
    owned_project(&state, &id, &user_id)?;

    state
        .orchestrator()
        .active_tasks(&id)
        .map(Json)
        .map_err(map_orchestrator_error)
}
