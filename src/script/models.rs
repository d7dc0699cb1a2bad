//! Data models for scripts and their embedded video job fields

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a script, assigned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptId(pub String);

impl ScriptId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an AI character from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(pub String);

impl CharacterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a server-side video rendering job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of the video job attached to a script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoJobStatus {
    /// No video has been requested
    #[default]
    None,
    /// Submitted, waiting for a render worker
    Queued,
    /// Rendering
    InProgress,
    /// Video is available at `final_video_path`
    Completed,
    /// Rendering failed
    Failed,
}

impl VideoJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "queued" => Some(Self::Queued),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Whether a job in this status keeps the polling loop alive.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::InProgress)
    }

    /// Terminal from the client's point of view; only a new submission leaves it.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for VideoJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of dialogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub speaker: CharacterId,
    pub text: String,
}

impl DialogueLine {
    pub fn new(speaker: CharacterId, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }
}

/// A single-field change to a dialogue line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEdit {
    Speaker(CharacterId),
    Text(String),
}

/// A character from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
}

/// A saved dialogue plus metadata and video job state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    pub id: ScriptId,

    /// Ordered dialogue lines
    pub dialogue: Vec<DialogueLine>,

    /// Characters taking part in the conversation (2 to 5, distinct; kept in
    /// the order the service returns them)
    pub selected_characters: Vec<CharacterId>,

    /// Prompt the script was generated from
    #[serde(default)]
    pub original_prompt: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub has_audio: bool,

    #[serde(default)]
    pub final_video_path: Option<String>,

    #[serde(default)]
    pub video_job_status: VideoJobStatus,

    /// Render progress in percent
    #[serde(default)]
    pub video_job_progress: f32,

    /// Server-provided message of the last failed job
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_job_error: Option<String>,
}

impl Script {
    /// Whether a render job for this script is queued or running
    pub fn has_active_job(&self) -> bool {
        self.video_job_status.is_active()
    }

    pub fn casts(&self, speaker: &CharacterId) -> bool {
        self.selected_characters.contains(speaker)
    }

    /// Reset the job fields for a freshly submitted job.
    pub fn mark_queued(&mut self) {
        self.video_job_status = VideoJobStatus::Queued;
        self.video_job_progress = 0.0;
        self.video_job_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names_round_trip() {
        for status in [
            VideoJobStatus::None,
            VideoJobStatus::Queued,
            VideoJobStatus::InProgress,
            VideoJobStatus::Completed,
            VideoJobStatus::Failed,
        ] {
            assert_eq!(VideoJobStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(VideoJobStatus::from_str("rendering"), None);
    }

    #[test]
    fn script_deserializes_from_camel_case_with_defaults() {
        let json = r#"{
            "id": "s1",
            "dialogue": [{"speaker": "a", "text": "hi"}],
            "selectedCharacters": ["a", "b"],
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:00:00Z",
            "videoJobStatus": "in_progress",
            "videoJobProgress": 40
        }"#;

        let script: Script = serde_json::from_str(json).unwrap();
        assert_eq!(script.id, ScriptId::new("s1"));
        assert_eq!(script.video_job_status, VideoJobStatus::InProgress);
        assert_eq!(script.video_job_progress, 40.0);
        assert!(script.final_video_path.is_none());
        assert!(!script.has_audio);
        assert!(script.has_active_job());
    }
}
