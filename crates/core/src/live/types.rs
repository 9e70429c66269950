//! Live stream event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::project::Project;
use crate::task::TaskKind;

/// One event on a live update stream.
///
/// Events from the same producer are strictly ordered; across producers
/// the interleaving is unordered. Serialized as tagged JSON for the
/// transport layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    /// Greeting sent once when the connection opens.
    Connected,
    /// Fresh progress fraction for a tracked task.
    TaskProgress {
        task_id: String,
        kind: TaskKind,
        progress: f64,
    },
    /// Terminal: the task completed. The task is no longer tracked.
    TaskDone { task_id: String, kind: TaskKind },
    /// Terminal: the task failed. The task is no longer tracked.
    TaskError {
        task_id: String,
        kind: TaskKind,
        error: String,
    },
    /// Another participant edited the project's metadata.
    ProjectUpdated { project: ProjectSnapshot },
    /// Another participant wrote live document bytes.
    DocUpdate { user_id: String, data: String },
    /// Terminal for the whole stream: the wall-clock polling cutoff was
    /// reached. Clients reconnect to keep watching.
    Expired,
}

/// Project state as shipped over a live stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSnapshot {
    pub id: String,
    pub name: String,
    pub description: String,
    pub has_origin_file: bool,
    pub has_transcription: bool,
    pub has_summary: bool,
    pub frames_extracted: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<&Project> for ProjectSnapshot {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            description: project.description.clone(),
            has_origin_file: project.origin_file.is_some(),
            has_transcription: project.transcription_file.is_some(),
            has_summary: project.summary_file.is_some(),
            frames_extracted: project.frames_extracted,
            updated_at: project.updated_at,
        }
    }
}
