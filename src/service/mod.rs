//! Service module for scriptreel
//!
//! Contract of the external script/video backend and its HTTP client.

mod client;
mod error;
mod http;
mod types;

pub use client::{build_service, ScriptService};
pub use error::{ServiceError, ServiceResult};
pub use http::HttpScriptService;
pub use types::{DialogueUpdate, JobStatusReport, ScriptListing, VideoSubmission};
