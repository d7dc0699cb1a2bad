//! Script module for scriptreel
//!
//! Data model shared by the store, the editor and the video job tracker.

mod models;
pub mod validation;

pub use models::{
    Character, CharacterId, DialogueLine, JobId, LineEdit, Script, ScriptId, VideoJobStatus,
};
pub use validation::{validate_dialogue, LineIssue};
