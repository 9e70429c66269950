//! Types for the pipeline orchestrator.

use serde::Deserialize;
use thiserror::Error;

use crate::task::TaskKind;

/// Admission failures: precondition violations rejected synchronously
/// before anything is persisted or dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdmissionError {
    /// The project has no source media to process.
    #[error("project has no origin file")]
    NoOriginFile,

    /// More than one active-task marker exists, or an unexpected one does.
    #[error("project already has active tasks")]
    ProjectBusy,

    /// While transcription is in flight only frame extraction may follow.
    #[error("only frames_extract may be submitted while transcribe is active")]
    OnlyFramesExtractAfterTranscribe,

    /// While frame extraction is in flight only transcription may follow.
    #[error("only transcribe may be submitted while frames_extract is active")]
    OnlyTranscribeAfterFramesExtract,

    #[error("project already has a transcription")]
    AlreadyTranscribed,

    #[error("project already has extracted frames")]
    FramesAlreadyExtracted,

    /// Frames require visual content; the origin file is audio-only.
    #[error("origin file is audio-only, frames cannot be extracted")]
    OriginFileIsAudio,

    /// Summarization may not start while other task rows are unfinished.
    #[error("project has unfinished tasks")]
    ProjectHasUnfinishedTasks,
}

/// Errors that can occur while orchestrating.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// A precondition rejected the submission; nothing was mutated.
    #[error("task not admitted: {0}")]
    Admission(#[from] AdmissionError),

    /// Task store failure.
    #[error("task store error: {0}")]
    TaskStore(#[from] crate::task::TaskError),

    /// Project store failure.
    #[error("project store error: {0}")]
    ProjectStore(#[from] crate::project::ProjectError),

    /// Status cache failure.
    #[error("status cache error: {0}")]
    Cache(#[from] crate::cache::CacheError),

    /// Queue publish failure. Task rows already committed stay committed;
    /// the store and the broker are not transactionally joined.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] crate::broker::BrokerError),

    /// A worker referenced a task id we have no row for.
    #[error("unknown task id from worker: {0}")]
    UnknownTask(String),

    /// A child row points at a parent that does not exist.
    #[error("task {task_id} references missing parent {parent_id}")]
    MissingParent { task_id: String, parent_id: String },
}

/// A task submission as it arrives from the client.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskRequest {
    /// What to run. Unknown kinds fail deserialization before reaching
    /// the orchestrator.
    pub kind: TaskKind,
    /// Optional free-text prompt forwarded to the worker.
    #[serde(default)]
    pub prompt: Option<String>,
}
