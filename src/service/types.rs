//! Request/response types of the script service.

use serde::{Deserialize, Serialize};

use crate::script::{DialogueLine, JobId, Script, VideoJobStatus};

/// Response of `list_scripts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptListing {
    pub scripts: Vec<Script>,
    /// Tokens the user can still spend on renders
    #[serde(default)]
    pub user_token_balance: i64,
}

/// Body of a dialogue replacement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueUpdate {
    pub dialogue: Vec<DialogueLine>,
}

/// Response of `submit_video_generation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSubmission {
    pub job_id: JobId,
    #[serde(default = "queued")]
    pub status: VideoJobStatus,
}

fn queued() -> VideoJobStatus {
    VideoJobStatus::Queued
}

/// Response of `get_job_status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusReport {
    pub status: VideoJobStatus,
    #[serde(default)]
    pub progress: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_video_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Job the report describes, when the service exposes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
}

impl JobStatusReport {
    pub fn new(status: VideoJobStatus, progress: f32) -> Self {
        Self {
            status,
            progress,
            final_video_path: None,
            error_message: None,
            job_id: None,
        }
    }

    /// Job fields as currently stored on a script.
    pub fn from_script(script: &Script) -> Self {
        Self {
            status: script.video_job_status,
            progress: script.video_job_progress,
            final_video_path: script.final_video_path.clone(),
            error_message: script.video_job_error.clone(),
            job_id: None,
        }
    }
}
