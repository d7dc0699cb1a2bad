//! Video job state machine
//!
//! The service only exposes a status string per script. The client adds one
//! state of its own: a submission it has made but no poll has confirmed yet.

use chrono::{DateTime, Duration, Utc};

use crate::script::{JobId, Script, VideoJobStatus};
use crate::service::JobStatusReport;

/// A submission waiting for its first confirming poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    pub job_id: JobId,
    pub submitted_at: DateTime<Utc>,
    /// Job status the script had before this submission
    pub previous_status: VideoJobStatus,
    /// Video the previous job produced, if any
    pub previous_video_path: Option<String>,
}

/// How long an unlabelled terminal report matching the previous job is
/// taken to describe that job rather than the new one.
pub const CONFIRMATION_WINDOW_SECS: i64 = 120;

impl PendingSubmission {
    pub fn new(job_id: JobId, script: &Script) -> Self {
        Self {
            job_id,
            submitted_at: Utc::now(),
            previous_status: script.video_job_status,
            previous_video_path: script.final_video_path.clone(),
        }
    }

    /// Whether a report without a job id may still describe the job that
    /// ran before this submission.
    fn may_describe_previous_job(&self, report: &JobStatusReport, now: DateTime<Utc>) -> bool {
        if report.job_id.is_some() || !report.status.is_terminal() {
            return false;
        }
        if report.status != self.previous_status {
            return false;
        }
        let new_video = match (&report.final_video_path, &self.previous_video_path) {
            (Some(reported), Some(previous)) => reported != previous,
            (Some(_), None) => true,
            (None, _) => false,
        };
        !new_video && now - self.submitted_at < Duration::seconds(CONFIRMATION_WINDOW_SECS)
    }
}

/// Where a script's video job stands
#[derive(Debug, Clone, PartialEq)]
pub enum JobPhase {
    /// No video has been requested
    Idle,
    /// Submitted locally, not yet reported by the service
    PendingConfirmation { job_id: JobId },
    Queued,
    InProgress { progress: f32 },
    Completed { video_path: Option<String> },
    Failed { message: String },
}

impl JobPhase {
    pub fn of(script: &Script, pending: Option<&PendingSubmission>) -> Self {
        match script.video_job_status {
            VideoJobStatus::None => Self::Idle,
            VideoJobStatus::Queued => match pending {
                Some(p) => Self::PendingConfirmation {
                    job_id: p.job_id.clone(),
                },
                None => Self::Queued,
            },
            VideoJobStatus::InProgress => Self::InProgress {
                progress: script.video_job_progress,
            },
            VideoJobStatus::Completed => Self::Completed {
                video_path: script.final_video_path.clone(),
            },
            VideoJobStatus::Failed => Self::Failed {
                message: script
                    .video_job_error
                    .clone()
                    .unwrap_or_else(|| "Video generation failed".to_string()),
            },
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::PendingConfirmation { .. } | Self::Queued | Self::InProgress { .. }
        )
    }
}

/// Outcome of checking a poll report against local state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportDecision {
    Apply,
    Ignore(&'static str),
}

/// Decide whether a status report may overwrite the local job state.
pub fn judge_report(
    current: VideoJobStatus,
    pending: Option<&PendingSubmission>,
    report: &JobStatusReport,
) -> ReportDecision {
    if let Some(pending) = pending {
        if let Some(job_id) = &report.job_id {
            if job_id != &pending.job_id {
                return ReportDecision::Ignore("report describes an earlier job");
            }
        }
        if report.status == VideoJobStatus::None {
            return ReportDecision::Ignore("submission not visible yet");
        }
        if pending.may_describe_previous_job(report, Utc::now()) {
            return ReportDecision::Ignore("report still describes the previous job");
        }
    }

    if current == VideoJobStatus::InProgress && report.status == VideoJobStatus::Queued {
        return ReportDecision::Ignore("stale queued report for a running job");
    }

    ReportDecision::Apply
}
