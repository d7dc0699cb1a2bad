//! Private edit buffer for one script's dialogue

use crate::script::{CharacterId, DialogueLine, LineEdit, Script, ScriptId};
use crate::{ReelError, Result};

/// How the session was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    /// First-time edit; the session closes on save
    Simple,
    /// Re-edit of a script that already has a video; the session stays
    /// open across saves so the user can regenerate
    ChangeScript,
}

/// Unsaved working copy of a script's dialogue
#[derive(Debug, Clone)]
pub struct EditSession {
    script_id: ScriptId,
    buffer: Vec<DialogueLine>,
    dirty: bool,
    ever_dirty: bool,
    mode: EditMode,
}

impl EditSession {
    /// Open a session on a copy of the script's current dialogue.
    pub fn start(script: &Script, mode: EditMode) -> Self {
        Self {
            script_id: script.id.clone(),
            buffer: script.dialogue.clone(),
            dirty: false,
            ever_dirty: false,
            mode,
        }
    }

    pub fn script_id(&self) -> &ScriptId {
        &self.script_id
    }

    pub fn buffer(&self) -> &[DialogueLine] {
        &self.buffer
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// An edit call has been made since the last save
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// An edit call has been made at any point in this session
    pub fn ever_dirty(&self) -> bool {
        self.ever_dirty
    }

    /// Whether the buffer differs from the given server copy.
    ///
    /// Compares content, so editing a line and then editing it back reports
    /// no changes even though `is_dirty` stays set.
    pub fn has_changes(&self, saved: &[DialogueLine]) -> bool {
        self.buffer.as_slice() != saved
    }

    pub fn edit_line(&mut self, index: usize, edit: LineEdit) -> Result<()> {
        let len = self.buffer.len();
        let line = self
            .buffer
            .get_mut(index)
            .ok_or(ReelError::IndexOutOfRange { index, len })?;

        match edit {
            LineEdit::Speaker(speaker) => line.speaker = speaker,
            LineEdit::Text(text) => line.text = text,
        }

        self.touch();
        Ok(())
    }

    pub fn add_line(&mut self, speaker: CharacterId) {
        self.buffer.push(DialogueLine::new(speaker, ""));
        self.touch();
    }

    /// Remove a line; the last remaining line cannot be removed.
    pub fn remove_line(&mut self, index: usize) -> Result<()> {
        let len = self.buffer.len();
        if index >= len {
            return Err(ReelError::IndexOutOfRange { index, len });
        }
        if len <= 1 {
            return Err(ReelError::MinimumLinesViolation);
        }

        self.buffer.remove(index);
        self.touch();
        Ok(())
    }

    /// Record a successful save; `ever_dirty` is kept.
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Record that the saved content went out for rendering; the next
    /// regenerate needs another edit and save.
    pub fn mark_submitted(&mut self) {
        self.ever_dirty = false;
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.ever_dirty = true;
    }
}
