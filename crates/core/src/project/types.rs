//! Project data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Broad media category of an uploaded file.
///
/// Frames can only be extracted from visual content, so the category
/// drives both admission checks and the summarize prerequisite set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Audio,
    Video,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Audio => "audio",
            FileCategory::Video => "video",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "audio" => Some(FileCategory::Audio),
            "video" => Some(FileCategory::Video),
            _ => None,
        }
    }
}

/// Reference to a stored media file. The blob itself lives in object
/// storage outside this system; only the metadata reference is kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRef {
    pub id: String,
    pub name: String,
    pub category: FileCategory,
}

/// Aggregate container for one media-processing effort.
///
/// The output references (`origin_file`, `transcription_file`,
/// `summary_file`, `frames_extracted`) are monotonic: each is set exactly
/// once and never un-set except by deleting the whole project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: String,
    pub origin_file: Option<FileRef>,
    /// File id of the transcription output, once produced.
    pub transcription_file: Option<String>,
    /// File id of the summary output, once produced.
    pub summary_file: Option<String>,
    pub frames_extracted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Whether every prerequisite for summarization is already satisfied.
    ///
    /// Transcription is always required; frame extraction only for video
    /// origins (audio has no visual content to extract).
    pub fn summarize_prereqs_met(&self) -> bool {
        if self.transcription_file.is_none() {
            return false;
        }
        match self.origin_file.as_ref().map(|f| f.category) {
            Some(FileCategory::Video) => self.frames_extracted,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(category: FileCategory) -> Project {
        Project {
            id: "p1".to_string(),
            user_id: "u1".to_string(),
            name: "demo".to_string(),
            description: String::new(),
            origin_file: Some(FileRef {
                id: "f1".to_string(),
                name: "talk.mp4".to_string(),
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
    fn test_prereqs_require_transcription() {
        let p = project(FileCategory::Audio);
        assert!(!p.summarize_prereqs_met());
    }

    #[test]
    fn test_audio_origin_needs_no_frames() {
        let mut p = project(FileCategory::Audio);
        p.transcription_file = Some("t1".to_string());
        assert!(p.summarize_prereqs_met());
    }

    #[test]
    fn test_video_origin_needs_frames() {
        let mut p = project(FileCategory::Video);
        p.transcription_file = Some("t1".to_string());
        assert!(!p.summarize_prereqs_met());

        p.frames_extracted = true;
        assert!(p.summarize_prereqs_met());
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(FileCategory::parse("audio"), Some(FileCategory::Audio));
        assert_eq!(FileCategory::parse("video"), Some(FileCategory::Video));
        assert_eq!(FileCategory::parse("text"), None);
    }
}
