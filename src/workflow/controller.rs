//! Script workflow controller
//!
//! Ties the store, the editor and the job tracker together for one view.
//! Every method takes `&mut self`, so user actions and poll ticks never
//! interleave; an embedding event loop multiplexes them, e.g. by selecting
//! over its input events and `next_poll()`.

use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Settings;
use crate::editor::{DialogueEditor, EditMode, EditSession};
use crate::script::validation::describe;
use crate::script::{validate_dialogue, CharacterId, LineEdit, Script, ScriptId};
use crate::service::{build_service, ScriptService, ServiceError, VideoSubmission};
use crate::store::{fetch_error, RefreshSummary, ScriptStore};
use crate::video::{IntervalTickSource, JobPhase, PollReport, TickSource, VideoJobTracker};
use crate::workflow::actions::{legal_actions, Action, LegalActions, SessionState};
use crate::{ReelError, Result};

/// Main workflow state for the scripts view
pub struct WorkflowController {
    service: Arc<dyn ScriptService>,
    store: ScriptStore,
    editor: DialogueEditor,
    tracker: VideoJobTracker,
    generation_cost: u32,
}

impl WorkflowController {
    /// Create a controller with an explicit service and tick source
    pub fn new(
        service: Arc<dyn ScriptService>,
        settings: &Settings,
        ticks: Arc<dyn TickSource>,
    ) -> Self {
        Self {
            service,
            store: ScriptStore::new(),
            editor: DialogueEditor::new(),
            tracker: VideoJobTracker::from_settings(settings, ticks),
            generation_cost: settings.video.generation_cost,
        }
    }

    /// Create a controller talking to the configured service on a real timer
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let service = build_service(settings)?;
        Ok(Self::new(service, settings, Arc::new(IntervalTickSource)))
    }

    pub fn store(&self) -> &ScriptStore {
        &self.store
    }

    pub fn scripts(&self) -> &[Script] {
        self.store.scripts()
    }

    pub fn script(&self, id: &ScriptId) -> Option<&Script> {
        self.store.get(id)
    }

    pub fn session(&self, id: &ScriptId) -> Option<&EditSession> {
        self.editor.session(id)
    }

    pub fn speaker_name<'a>(&'a self, id: &'a CharacterId) -> &'a str {
        self.store.catalog().display_name(id)
    }

    pub fn token_balance(&self) -> i64 {
        self.store.token_balance()
    }

    pub fn generation_cost(&self) -> u32 {
        self.generation_cost
    }

    pub fn can_afford_video(&self) -> bool {
        self.store.token_balance() >= i64::from(self.generation_cost)
    }

    pub fn job_phase(&self, id: &ScriptId) -> Option<JobPhase> {
        self.store.get(id).map(|s| self.tracker.phase(s))
    }

    pub fn is_polling(&self) -> bool {
        self.tracker.is_polling()
    }

    fn require_script(&self, id: &ScriptId) -> Result<&Script> {
        self.store
            .get(id)
            .ok_or_else(|| ReelError::ScriptNotFound(id.clone()))
    }

    fn actions_for(&self, script: &Script, can_afford: bool) -> LegalActions {
        let session = self
            .editor
            .session(&script.id)
            .map(|s| SessionState::of(s, script));
        legal_actions(script.video_job_status, session, can_afford)
    }

    /// Actions to present for a script
    pub fn legal_actions(&self, id: &ScriptId) -> Result<LegalActions> {
        let script = self.require_script(id)?;
        Ok(self.actions_for(script, self.can_afford_video()))
    }

    fn require(&self, id: &ScriptId, action: Action) -> Result<()> {
        if self.legal_actions(id)?.allows(action) {
            Ok(())
        } else {
            Err(ReelError::ActionNotAllowed {
                action,
                script_id: id.clone(),
            })
        }
    }

    /// Load scripts and characters, then start polling if any job is active.
    pub async fn load(&mut self) -> Result<()> {
        self.store.load(self.service.as_ref()).await?;
        self.tracker.sync(&self.store);
        info!("Loaded {} scripts", self.store.len());
        Ok(())
    }

    /// Re-fetch scripts without touching open edit buffers.
    pub async fn refresh(&mut self) -> Result<RefreshSummary> {
        let keep = self.tracker.pending_ids();
        let summary = self
            .store
            .refresh_silently(self.service.as_ref(), &keep)
            .await?;

        let gone: Vec<ScriptId> = self
            .editor
            .ids()
            .into_iter()
            .filter(|id| !self.store.contains(id))
            .collect();
        for id in gone {
            debug!("Closing edit session for vanished script {}", id);
            self.editor.close(&id);
        }

        self.tracker.sync(&self.store);
        Ok(summary)
    }

    /// Open a simple edit session, or reuse the one already open.
    pub fn start_edit(&mut self, id: &ScriptId) -> Result<&EditSession> {
        self.open_session(id, Action::Edit, EditMode::Simple)
    }

    /// Re-open a completed script for editing and regeneration.
    pub fn change_script(&mut self, id: &ScriptId) -> Result<&EditSession> {
        self.open_session(id, Action::ChangeScript, EditMode::ChangeScript)
    }

    fn open_session(
        &mut self,
        id: &ScriptId,
        action: Action,
        mode: EditMode,
    ) -> Result<&EditSession> {
        if !self.editor.is_editing(id) {
            self.require(id, action)?;
        }

        let script = self
            .store
            .get(id)
            .ok_or_else(|| ReelError::ScriptNotFound(id.clone()))?;
        Ok(&*self.editor.start(script, mode))
    }

    /// Session for a script whose job is not running
    fn editable_session(&mut self, id: &ScriptId) -> Result<&mut EditSession> {
        let script = self.require_script(id)?;
        if script.has_active_job() {
            return Err(ReelError::JobActive(id.clone()));
        }

        self.editor
            .session_mut(id)
            .ok_or_else(|| ReelError::NoEditSession(id.clone()))
    }

    pub fn edit_line(&mut self, id: &ScriptId, index: usize, edit: LineEdit) -> Result<()> {
        self.editable_session(id)?.edit_line(index, edit)
    }

    /// Append an empty line.
    ///
    /// Without an explicit speaker the next cast member after the last
    /// line's speaker takes the line.
    pub fn add_line(&mut self, id: &ScriptId, speaker: Option<CharacterId>) -> Result<()> {
        let speaker = match speaker {
            Some(speaker) => speaker,
            None => {
                let script = self.require_script(id)?;
                let last = self
                    .editor
                    .session(id)
                    .and_then(|s| s.buffer().last())
                    .map(|l| l.speaker.clone());
                next_speaker(script, last.as_ref())
                    .ok_or_else(|| ReelError::Validation {
                        message: "script has no characters to speak the line".to_string(),
                        issues: Vec::new(),
                    })?
            }
        };

        self.editable_session(id)?.add_line(speaker);
        Ok(())
    }

    pub fn remove_line(&mut self, id: &ScriptId, index: usize) -> Result<()> {
        self.editable_session(id)?.remove_line(index)
    }

    /// Whether the open buffer differs from the stored script
    pub fn has_changes(&self, id: &ScriptId) -> Result<bool> {
        let script = self.require_script(id)?;
        let session = self
            .editor
            .session(id)
            .ok_or_else(|| ReelError::NoEditSession(id.clone()))?;
        Ok(session.has_changes(&script.dialogue))
    }

    /// Send the buffer to the service as the script's new dialogue.
    ///
    /// Simple sessions close on success; change-script sessions stay open
    /// so the saved script can be rendered right away. On failure the
    /// buffer and the store are left as they were.
    pub async fn save(&mut self, id: &ScriptId) -> Result<()> {
        let script = self.require_script(id)?;
        if script.has_active_job() {
            return Err(ReelError::JobActive(id.clone()));
        }
        let session = self
            .editor
            .session(id)
            .ok_or_else(|| ReelError::NoEditSession(id.clone()))?;
        self.require(id, Action::Save)?;

        let issues = validate_dialogue(session.buffer(), &script.selected_characters);
        if !issues.is_empty() {
            return Err(ReelError::Validation {
                message: describe(&issues),
                issues,
            });
        }

        let dialogue = session.buffer().to_vec();
        let mode = session.mode();

        let updated = self
            .service
            .update_script_dialogue(id, &dialogue)
            .await
            .map_err(|e| save_error(id, e))?;

        info!("Saved {} dialogue lines for script {}", dialogue.len(), id);

        if !self.store.replace(id, updated) {
            self.editor.close(id);
            return Ok(());
        }

        match mode {
            EditMode::Simple => {
                self.editor.close(id);
            }
            EditMode::ChangeScript => {
                if let Some(session) = self.editor.session_mut(id) {
                    session.mark_saved();
                }
            }
        }

        self.tracker.sync(&self.store);
        Ok(())
    }

    /// Discard the buffer without contacting the service.
    pub fn cancel(&mut self, id: &ScriptId) -> Result<()> {
        self.editor
            .close(id)
            .map(|_| debug!("Edit session for script {} cancelled", id))
            .ok_or_else(|| ReelError::NoEditSession(id.clone()))
    }

    /// Request a video for a script whose dialogue is saved.
    pub async fn generate(&mut self, id: &ScriptId) -> Result<VideoSubmission> {
        let script = self.require_script(id)?;
        if script.has_active_job() {
            return Err(ReelError::JobActive(id.clone()));
        }
        if self.editor.session(id).is_some_and(EditSession::is_dirty) {
            return Err(ReelError::UnsavedChanges(id.clone()));
        }
        // Tokens are checked by the tracker so the caller gets a precise error.
        if !self.actions_for(script, true).allows(Action::Generate) {
            return Err(ReelError::ActionNotAllowed {
                action: Action::Generate,
                script_id: id.clone(),
            });
        }

        let submission = self
            .tracker
            .generate(
                self.service.as_ref(),
                &mut self.store,
                id,
                self.generation_cost,
            )
            .await?;

        if let Some(session) = self.editor.session_mut(id) {
            session.mark_submitted();
        }
        Ok(submission)
    }

    /// Delete a script on the service and drop it locally.
    pub async fn delete(&mut self, id: &ScriptId) -> Result<()> {
        if !self.store.contains(id) {
            return Ok(());
        }
        self.require(id, Action::Delete)?;

        match self.service.delete_script(id).await {
            Ok(()) => {}
            Err(ServiceError::NotFound(_)) => debug!("Script {} was already deleted", id),
            Err(e) => return Err(fetch_error(e)),
        }

        self.store.remove(id);
        self.editor.close(id);
        self.tracker.forget(id);
        self.tracker.sync(&self.store);
        info!("Deleted script {}", id);
        Ok(())
    }

    /// Poll job status once, regardless of the timer.
    pub async fn poll_once(&mut self) -> PollReport {
        self.tracker
            .poll_once(self.service.as_ref(), &mut self.store)
            .await
    }

    /// Wait for the next poll tick and run the poll.
    ///
    /// Stays pending while no job is active.
    pub async fn next_poll(&mut self) -> PollReport {
        self.tracker.wait_tick().await;
        self.poll_once().await
    }

    /// Stop polling and close every session; call when the view goes away.
    pub fn shutdown(&mut self) {
        self.tracker.stop();
        self.editor.close_all();
    }
}

fn next_speaker(script: &Script, last: Option<&CharacterId>) -> Option<CharacterId> {
    let cast = &script.selected_characters;
    let next = last
        .and_then(|speaker| cast.iter().position(|c| c == speaker))
        .map(|index| (index + 1) % cast.len())
        .unwrap_or(0);
    cast.get(next).cloned()
}

fn save_error(id: &ScriptId, err: ServiceError) -> ReelError {
    match err {
        ServiceError::Conflict(message) => ReelError::Conflict(message),
        ServiceError::Validation(message) => ReelError::Validation {
            message,
            issues: Vec::new(),
        },
        ServiceError::NotFound(_) => ReelError::ScriptNotFound(id.clone()),
        other => fetch_error(other),
    }
}
