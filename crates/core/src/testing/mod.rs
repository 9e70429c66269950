//! Testing utilities and mock implementations for E2E tests.
//!
//! Mocks for the external-service traits plus fixture helpers, so the
//! full pipeline can be exercised without a real worker fleet.
//!
//! # Example
//!
//! ```rust,ignore
//! use recap_core::testing::{fixtures, MockBroker};
//!
//! let broker = MockBroker::new();
//!
//! // ... run a pipeline against the mock ...
//!
//! let dispatched = broker.published_to("transcribe").await;
//! assert_eq!(dispatched.len(), 1);
//! ```

mod mock_broker;

pub use mock_broker::{MockBroker, RecordedPublish};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::Utc;

    use crate::project::{FileCategory, FileRef, Project};
    use crate::task::{Task, TaskKind};

    /// Create a bare project with no files attached.
    pub fn project(id: &str) -> Project {
        Project {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            name: format!("Project {}", id),
            description: String::new(),
            origin_file: None,
            transcription_file: None,
            summary_file: None,
            frames_extracted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Create a project with a video origin file and no outputs yet.
    pub fn video_project(id: &str) -> Project {
        let mut p = project(id);
        p.origin_file = Some(FileRef {
            id: format!("file-{}", id),
            name: "recording.mp4".to_string(),
            category: FileCategory::Video,
        });
        p
    }

    /// Create a project with an audio origin file and no outputs yet.
    pub fn audio_project(id: &str) -> Project {
        let mut p = project(id);
        p.origin_file = Some(FileRef {
            id: format!("file-{}", id),
            name: "recording.mp3".to_string(),
            category: FileCategory::Audio,
        });
        p
    }

    /// Create a standalone task row with reasonable defaults.
    pub fn task(id: &str, project_id: &str, kind: TaskKind) -> Task {
        Task {
            id: id.to_string(),
            project_id: project_id.to_string(),
            user_id: "user-1".to_string(),
            kind,
            prompt: None,
            parent_id: None,
            done: false,
            subtask_count: 0,
            created_at: Utc::now(),
        }
    }
}
