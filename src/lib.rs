//! scriptreel - Script-edit and video-generation workflow for AI character dialogues
//!
//! The library keeps a client-side cache of dialogue scripts, lets a user edit
//! them in private buffers, and tracks the server-side video render jobs by
//! polling until every job settles.

pub mod cli;
pub mod config;
pub mod editor;
pub mod script;
pub mod service;
pub mod store;
pub mod video;
pub mod workflow;

use thiserror::Error;

use crate::script::{LineIssue, ScriptId};
use crate::workflow::Action;

/// Main error type for scriptreel
#[derive(Error, Debug)]
pub enum ReelError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transient; the caller may retry
    #[error("Failed to reach the script service: {0}")]
    Fetch(String),

    /// User-fixable; the edit buffer is kept
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        issues: Vec<LineIssue>,
    },

    /// The script changed on the server since it was loaded
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient tokens: balance is {balance}, a video costs {cost}")]
    InsufficientTokens { balance: i64, cost: u32 },

    #[error("Video submission rejected: {0}")]
    Submission(String),

    #[error("Line {index} is out of range (dialogue has {len} lines)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Dialogue must keep at least one line")]
    MinimumLinesViolation,

    #[error("Script not found: {0}")]
    ScriptNotFound(ScriptId),

    #[error("No edit session is open for script {0}")]
    NoEditSession(ScriptId),

    #[error("Script {0} has unsaved changes")]
    UnsavedChanges(ScriptId),

    #[error("A video job is already running for script {0}")]
    JobActive(ScriptId),

    #[error("'{action}' is not available for script {script_id}")]
    ActionNotAllowed { action: Action, script_id: ScriptId },
}

impl ReelError {
    /// Whether retrying the same call may succeed without user changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }
}

pub type Result<T> = std::result::Result<T, ReelError>;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "scriptreel";
