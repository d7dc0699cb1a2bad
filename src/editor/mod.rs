//! Editor module for scriptreel
//!
//! Per-script edit sessions that stay independent of the store until saved.

mod session;

use std::collections::HashMap;
use tracing::debug;

use crate::script::{Script, ScriptId};
pub use session::{EditMode, EditSession};

/// Open edit sessions, at most one per script
#[derive(Debug, Default)]
pub struct DialogueEditor {
    sessions: HashMap<ScriptId, EditSession>,
}

impl DialogueEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for a script, or return the one already open.
    pub fn start(&mut self, script: &Script, mode: EditMode) -> &mut EditSession {
        self.sessions.entry(script.id.clone()).or_insert_with(|| {
            debug!("Opening {:?} edit session for script {}", mode, script.id);
            EditSession::start(script, mode)
        })
    }

    pub fn session(&self, id: &ScriptId) -> Option<&EditSession> {
        self.sessions.get(id)
    }

    pub fn session_mut(&mut self, id: &ScriptId) -> Option<&mut EditSession> {
        self.sessions.get_mut(id)
    }

    /// Scripts with an open session
    pub fn ids(&self) -> Vec<ScriptId> {
        self.sessions.keys().cloned().collect()
    }

    pub fn is_editing(&self, id: &ScriptId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Close a session, discarding its buffer.
    pub fn close(&mut self, id: &ScriptId) -> Option<EditSession> {
        self.sessions.remove(id)
    }

    pub fn close_all(&mut self) {
        self.sessions.clear();
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
