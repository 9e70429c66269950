//! Pure admission checks for task submissions.
//!
//! One validation path per kind over a closed enum; the checks run in a
//! fixed order and each violation maps to a distinct error so callers can
//! surface a specific reason.

use crate::project::{FileCategory, Project};
use crate::task::TaskKind;

use super::types::AdmissionError;

/// Validate a submission against the project's outputs and the set of
/// active-task markers currently visible in the status cache.
///
/// `active_kinds` are the kinds with a live marker for this project;
/// `has_unfinished_tasks` reflects persisted task rows and only matters
/// for `Summarize`.
pub fn check_admission(
    kind: TaskKind,
    project: &Project,
    active_kinds: &[TaskKind],
    has_unfinished_tasks: bool,
) -> Result<(), AdmissionError> {
    let origin = project
        .origin_file
        .as_ref()
        .ok_or(AdmissionError::NoOriginFile)?;

    // The worker fleet handles at most one media-extraction stage per
    // project at a time; the two stages may only follow each other.
    match active_kinds {
        [] => {}
        [TaskKind::Transcribe] => {
            if kind != TaskKind::FramesExtract {
                return Err(AdmissionError::OnlyFramesExtractAfterTranscribe);
            }
        }
        [TaskKind::FramesExtract] => {
            if kind != TaskKind::Transcribe {
                return Err(AdmissionError::OnlyTranscribeAfterFramesExtract);
            }
        }
        _ => return Err(AdmissionError::ProjectBusy),
    }

    match kind {
        TaskKind::Transcribe => {
            if project.transcription_file.is_some() {
                return Err(AdmissionError::AlreadyTranscribed);
            }
        }
        TaskKind::FramesExtract => {
            if project.frames_extracted {
                return Err(AdmissionError::FramesAlreadyExtracted);
            }
            if origin.category == FileCategory::Audio {
                return Err(AdmissionError::OriginFileIsAudio);
            }
        }
        TaskKind::SummaryEdit => {}
        TaskKind::Summarize => {
            if has_unfinished_tasks {
                return Err(AdmissionError::ProjectHasUnfinishedTasks);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::FileRef;
    use chrono::Utc;

    fn project(category: FileCategory) -> Project {
        Project {
            id: "p1".to_string(),
            user_id: "u1".to_string(),
            name: "demo".to_string(),
            description: String::new(),
            origin_file: Some(FileRef {
                id: "f1".to_string(),
                name: "talk".to_string(),
                category,
            }),
            transcription_file: None,
            summary_file: None,
            frames_extracted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_no_origin_file() {
        let mut p = project(FileCategory::Video);
        p.origin_file = None;
        assert_eq!(
            check_admission(TaskKind::Transcribe, &p, &[], false),
            Err(AdmissionError::NoOriginFile)
        );
    }

    #[test]
    fn test_idle_project_accepts_transcribe() {
        let p = project(FileCategory::Video);
        assert!(check_admission(TaskKind::Transcribe, &p, &[], false).is_ok());
    }

    #[test]
    fn test_two_markers_is_busy() {
        let p = project(FileCategory::Video);
        assert_eq!(
            check_admission(
                TaskKind::Transcribe,
                &p,
                &[TaskKind::Transcribe, TaskKind::FramesExtract],
                false
            ),
            Err(AdmissionError::ProjectBusy)
        );
    }

    #[test]
    fn test_only_complementary_kind_during_transcribe() {
        let p = project(FileCategory::Video);
        let active = [TaskKind::Transcribe];

        assert!(check_admission(TaskKind::FramesExtract, &p, &active, false).is_ok());
        assert_eq!(
            check_admission(TaskKind::Transcribe, &p, &active, false),
            Err(AdmissionError::OnlyFramesExtractAfterTranscribe)
        );
        assert_eq!(
            check_admission(TaskKind::Summarize, &p, &active, false),
            Err(AdmissionError::OnlyFramesExtractAfterTranscribe)
        );
    }

    #[test]
    fn test_only_complementary_kind_during_frames_extract() {
        let p = project(FileCategory::Video);
        let active = [TaskKind::FramesExtract];

        assert!(check_admission(TaskKind::Transcribe, &p, &active, false).is_ok());
        assert_eq!(
            check_admission(TaskKind::FramesExtract, &p, &active, false),
            Err(AdmissionError::OnlyTranscribeAfterFramesExtract)
        );
    }

    #[test]
    fn test_non_extraction_marker_is_busy() {
        let p = project(FileCategory::Video);
        assert_eq!(
            check_admission(TaskKind::Transcribe, &p, &[TaskKind::Summarize], false),
            Err(AdmissionError::ProjectBusy)
        );
    }

    #[test]
    fn test_duplicate_transcription_rejected() {
        let mut p = project(FileCategory::Video);
        p.transcription_file = Some("t1".to_string());
        assert_eq!(
            check_admission(TaskKind::Transcribe, &p, &[], false),
            Err(AdmissionError::AlreadyTranscribed)
        );
    }

    #[test]
    fn test_duplicate_frames_rejected() {
        let mut p = project(FileCategory::Video);
        p.frames_extracted = true;
        assert_eq!(
            check_admission(TaskKind::FramesExtract, &p, &[], false),
            Err(AdmissionError::FramesAlreadyExtracted)
        );
    }

    #[test]
    fn test_audio_origin_rejects_frames() {
        let p = project(FileCategory::Audio);
        assert_eq!(
            check_admission(TaskKind::FramesExtract, &p, &[], false),
            Err(AdmissionError::OriginFileIsAudio)
        );
    }

    #[test]
    fn test_summary_edit_has_no_precondition() {
        let mut p = project(FileCategory::Audio);
        p.transcription_file = Some("t1".to_string());
        p.summary_file = Some("s1".to_string());
        assert!(check_admission(TaskKind::SummaryEdit, &p, &[], false).is_ok());
    }

    #[test]
    fn test_summarize_rejected_with_unfinished_tasks() {
        let p = project(FileCategory::Video);
        assert_eq!(
            check_admission(TaskKind::Summarize, &p, &[], true),
            Err(AdmissionError::ProjectHasUnfinishedTasks)
        );
        assert!(check_admission(TaskKind::Summarize, &p, &[], false).is_ok());
    }
}
