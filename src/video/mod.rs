//! Video module for scriptreel
//!
//! Render job submission, the job state machine and the polling loop.

mod job;
mod ticker;
mod tracker;

pub use job::{judge_report, JobPhase, PendingSubmission, ReportDecision};
pub use ticker::{IntervalTickSource, ManualTickSource, TickSource, Ticker};
pub use tracker::{PollReport, VideoJobTracker};
