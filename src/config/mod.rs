//! Configuration module for scriptreel
//!
//! Handles loading and managing application settings from TOML files.

mod settings;

pub use settings::{PollSource, Settings};
