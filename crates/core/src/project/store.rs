//! Project storage trait.

use thiserror::Error;

use super::{FileRef, Project};

/// Error type for project store operations.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("project not found: {0}")]
    NotFound(String),

    /// A monotonic reference was already set; outputs are written exactly
    /// once per project.
    #[error("project {project_id} already has {field}")]
    AlreadySet {
        project_id: String,
        field: &'static str,
    },

    #[error("database error: {0}")]
    Database(String),
}

/// Fields for a project about to be created.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub user_id: String,
    pub name: String,
    pub description: String,
}

/// Trait for project storage backends.
pub trait ProjectStore: Send + Sync {
    fn create(&self, project: NewProject) -> Result<Project, ProjectError>;

    fn get(&self, id: &str) -> Result<Option<Project>, ProjectError>;

    fn list_by_user(&self, user_id: &str) -> Result<Vec<Project>, ProjectError>;

    /// Update name/description; bumps `updated_at`.
    fn update(&self, id: &str, name: &str, description: &str) -> Result<(), ProjectError>;

    fn delete(&self, id: &str) -> Result<(), ProjectError>;

    /// Attach the origin media file. Fails with `AlreadySet` if one exists.
    fn set_origin_file(&self, id: &str, file: &FileRef) -> Result<(), ProjectError>;

    /// Record the transcription output reference. Set-exactly-once.
    fn set_transcription_file(&self, id: &str, file_id: &str) -> Result<(), ProjectError>;

    /// Record the summary output reference. Set-exactly-once.
    fn set_summary_file(&self, id: &str, file_id: &str) -> Result<(), ProjectError>;

    /// Flip the frames-extracted flag. Set-exactly-once.
    fn set_frames_extracted(&self, id: &str) -> Result<(), ProjectError>;
}
