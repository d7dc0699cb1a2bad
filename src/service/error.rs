//! Script service error types.

use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 409: the update was based on a stale copy
    #[error("Conflicting update: {0}")]
    Conflict(String),

    /// 422: the service refused the payload
    #[error("Rejected by service: {0}")]
    Validation(String),

    /// 402: not enough tokens for a render
    #[error("Insufficient token balance: {0}")]
    InsufficientTokens(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ServiceError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Network(_) => true,
            ServiceError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
