//! Store module for scriptreel
//!
//! Client-side cache of scripts and the character catalog.

mod cache;
mod catalog;

pub(crate) use cache::fetch_error;
pub use cache::{RefreshSummary, ScriptStore};
pub use catalog::CharacterCatalog;
