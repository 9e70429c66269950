//! Task data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One unit of pipeline work dispatched to an external worker.
///
/// The kind set is closed: anything else is rejected at the API boundary
/// during deserialization and is unrepresentable here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Speech-to-text over the project's origin media.
    Transcribe,
    /// Key frame extraction from a video origin.
    FramesExtract,
    /// Text summarization over transcription (and frames, for video).
    Summarize,
    /// Re-run summarization against an existing summary with a new prompt.
    SummaryEdit,
}

impl TaskKind {
    /// Stable string form, used in cache keys and database rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Transcribe => "transcribe",
            TaskKind::FramesExtract => "frames_extract",
            TaskKind::Summarize => "summarize",
            TaskKind::SummaryEdit => "summary_edit",
        }
    }

    /// Parse the stable string form back into a kind.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "transcribe" => Some(TaskKind::Transcribe),
            "frames_extract" => Some(TaskKind::FramesExtract),
            "summarize" => Some(TaskKind::Summarize),
            "summary_edit" => Some(TaskKind::SummaryEdit),
            _ => None,
        }
    }

    /// Name of the outbound work queue for this kind.
    ///
    /// Summary edits are processed by the same workers as fresh summaries,
    /// so they share the `summarize` queue.
    pub fn queue(&self) -> &'static str {
        match self {
            TaskKind::Transcribe => "transcribe",
            TaskKind::FramesExtract => "frames_extract",
            TaskKind::Summarize | TaskKind::SummaryEdit => "summarize",
        }
    }

    /// Whether this kind gates a summarize fan-out (the two media
    /// extraction stages that must finish before the parent runs).
    pub fn is_gating(&self) -> bool {
        matches!(self, TaskKind::Transcribe | TaskKind::FramesExtract)
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted pipeline task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique id (uuid v4).
    pub id: String,
    /// Owning project.
    pub project_id: String,
    /// User who submitted the work.
    pub user_id: String,
    /// What kind of work this is.
    pub kind: TaskKind,
    /// Optional free-text prompt forwarded to the worker.
    pub prompt: Option<String>,
    /// Parent task id for fan-out children; `None` for roots.
    pub parent_id: Option<String>,
    /// Terminal flag; flips to true exactly once.
    pub done: bool,
    /// Number of units of work under a parent (children + the parent's
    /// own stage). Only meaningful on parents.
    pub subtask_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Whether this task is the root of its family.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_string_round_trip() {
        for kind in [
            TaskKind::Transcribe,
            TaskKind::FramesExtract,
            TaskKind::Summarize,
            TaskKind::SummaryEdit,
        ] {
            assert_eq!(TaskKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(TaskKind::parse("bogus"), None);
    }

    #[test]
    fn test_kind_serde_is_snake_case() {
        let json = serde_json::to_string(&TaskKind::FramesExtract).unwrap();
        assert_eq!(json, "\"frames_extract\"");

        let parsed: Result<TaskKind, _> = serde_json::from_str("\"explode\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_summary_edit_shares_summarize_queue() {
        assert_eq!(TaskKind::SummaryEdit.queue(), TaskKind::Summarize.queue());
        assert_ne!(TaskKind::Transcribe.queue(), TaskKind::Summarize.queue());
    }

    #[test]
    fn test_gating_kinds() {
        assert!(TaskKind::Transcribe.is_gating());
        assert!(TaskKind::FramesExtract.is_gating());
        assert!(!TaskKind::Summarize.is_gating());
        assert!(!TaskKind::SummaryEdit.is_gating());
    }
}
