//! Which actions a script offers in its current state

use std::fmt;

use crate::editor::{EditMode, EditSession};
use crate::script::{Script, VideoJobStatus};

/// A user-facing action on a script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ViewDialogue,
    Edit,
    Generate,
    ViewProgress,
    ViewVideo,
    /// Re-open a finished script for editing and regeneration
    ChangeScript,
    Save,
    Cancel,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewDialogue => "view dialogue",
            Self::Edit => "edit",
            Self::Generate => "generate",
            Self::ViewProgress => "view progress",
            Self::ViewVideo => "view video",
            Self::ChangeScript => "change script",
            Self::Save => "save",
            Self::Cancel => "cancel",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action that is shown, and whether it can be used right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionGate {
    pub action: Action,
    pub enabled: bool,
}

/// Actions shown for one script, in display order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegalActions {
    gates: Vec<ActionGate>,
}

impl LegalActions {
    fn push(&mut self, action: Action, enabled: bool) {
        self.gates.push(ActionGate { action, enabled });
    }

    pub fn gates(&self) -> &[ActionGate] {
        &self.gates
    }

    /// Shown, whether enabled or not
    pub fn is_presented(&self, action: Action) -> bool {
        self.gates.iter().any(|g| g.action == action)
    }

    /// Shown and enabled
    pub fn allows(&self, action: Action) -> bool {
        self.gates.iter().any(|g| g.action == action && g.enabled)
    }

    pub fn enabled(&self) -> impl Iterator<Item = Action> + '_ {
        self.gates.iter().filter(|g| g.enabled).map(|g| g.action)
    }
}

/// Edit session facts that gate actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub mode: EditMode,
    pub dirty: bool,
    pub ever_dirty: bool,
    pub has_changes: bool,
}

impl SessionState {
    pub fn of(session: &EditSession, script: &Script) -> Self {
        Self {
            mode: session.mode(),
            dirty: session.is_dirty(),
            ever_dirty: session.ever_dirty(),
            has_changes: session.has_changes(&script.dialogue),
        }
    }
}

/// Work out the actions for a script from its job status, its edit session
/// and whether the user can pay for a render.
pub fn legal_actions(
    status: VideoJobStatus,
    session: Option<SessionState>,
    can_afford: bool,
) -> LegalActions {
    let mut actions = LegalActions::default();

    if status.is_active() {
        actions.push(Action::ViewProgress, true);
        return actions;
    }

    match session {
        None if status == VideoJobStatus::Completed => {
            actions.push(Action::ViewVideo, true);
            actions.push(Action::ChangeScript, true);
            actions.push(Action::Delete, true);
        }
        None => {
            actions.push(Action::ViewDialogue, true);
            actions.push(Action::Edit, true);
            actions.push(Action::Generate, can_afford);
            actions.push(Action::Delete, true);
        }
        Some(SessionState {
            mode: EditMode::Simple,
            ..
        }) => {
            actions.push(Action::Save, true);
            actions.push(Action::Cancel, true);
        }
        Some(state) => {
            actions.push(Action::Save, state.has_changes);
            actions.push(
                Action::Generate,
                state.ever_dirty && !state.dirty && can_afford,
            );
            actions.push(Action::Cancel, true);
        }
    }

    actions
}
