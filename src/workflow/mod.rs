//! Workflow module for scriptreel
//!
//! Action gating and the controller behind the scripts view.

mod actions;
mod controller;

pub use actions::{legal_actions, Action, ActionGate, LegalActions, SessionState};
pub use controller::WorkflowController;
