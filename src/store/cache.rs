//! In-memory cache of the user's scripts
//!
//! Scripts are only ever written whole (`replace`) or through a job-field
//! merge keyed by id. Edit buffers hold their own copies, so nothing in
//! here can reach into an open edit.

use std::collections::HashSet;
use tracing::{debug, warn};

use crate::script::validation::{MAX_CHARACTERS, MIN_CHARACTERS};
use crate::script::{Script, ScriptId, VideoJobStatus};
use crate::service::{JobStatusReport, ScriptListing, ScriptService, ServiceError};
use crate::store::CharacterCatalog;
use crate::{ReelError, Result};

/// What a silent refresh changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
}

/// Client-side source of truth for scripts
#[derive(Debug, Default)]
pub struct ScriptStore {
    scripts: Vec<Script>,
    token_balance: i64,
    catalog: CharacterCatalog,
    focused: Option<ScriptId>,
}

pub(crate) fn fetch_error(err: ServiceError) -> ReelError {
    ReelError::Fetch(err.to_string())
}

impl ScriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch every script plus the character catalog.
    pub async fn load(&mut self, service: &dyn ScriptService) -> Result<()> {
        let listing = service.list_scripts().await.map_err(fetch_error)?;

        match service.list_characters().await {
            Ok(characters) => self.catalog.replace(characters),
            Err(e) => warn!("Failed to load character catalog: {}", e),
        }

        self.set_listing(listing);
        Ok(())
    }

    /// Install a listing wholesale.
    pub fn set_listing(&mut self, listing: ScriptListing) {
        for script in &listing.scripts {
            warn_on_invariants(script);
        }

        self.scripts = listing.scripts;
        self.token_balance = listing.user_token_balance;

        if let Some(focused) = &self.focused {
            if !self.contains(focused) {
                self.focused = None;
            }
        }

        debug!("Loaded {} scripts", self.scripts.len());
    }

    /// Re-fetch the list without disturbing order or focus.
    ///
    /// Scripts listed in `keep_job_fields` keep their local job state; those
    /// are submissions the service may not report yet.
    pub async fn refresh_silently(
        &mut self,
        service: &dyn ScriptService,
        keep_job_fields: &HashSet<ScriptId>,
    ) -> Result<RefreshSummary> {
        let listing = service.list_scripts().await.map_err(fetch_error)?;
        Ok(self.apply_listing(listing, keep_job_fields))
    }

    /// Merge a listing into the cache keyed by id.
    ///
    /// Known scripts are updated where they stand, new ones are appended and
    /// scripts the service no longer lists are dropped.
    pub fn apply_listing(
        &mut self,
        listing: ScriptListing,
        keep_job_fields: &HashSet<ScriptId>,
    ) -> RefreshSummary {
        let mut summary = RefreshSummary::default();
        let incoming_ids: HashSet<ScriptId> =
            listing.scripts.iter().map(|s| s.id.clone()).collect();

        let before = self.scripts.len();
        self.scripts.retain(|s| incoming_ids.contains(&s.id));
        summary.removed = before - self.scripts.len();

        for mut incoming in listing.scripts {
            warn_on_invariants(&incoming);

            match self.position(&incoming.id) {
                Some(index) => {
                    let current = &mut self.scripts[index];
                    if keep_job_fields.contains(&incoming.id) {
                        copy_job_fields(current, &mut incoming);
                    }
                    if *current != incoming {
                        *current = incoming;
                        summary.updated += 1;
                    }
                }
                None => {
                    self.scripts.push(incoming);
                    summary.added += 1;
                }
            }
        }

        self.token_balance = listing.user_token_balance;

        if let Some(focused) = &self.focused {
            if !self.contains(focused) {
                self.focused = None;
            }
        }

        summary
    }

    /// Overwrite one script. Returns false if the script is no longer cached.
    pub fn replace(&mut self, id: &ScriptId, script: Script) -> bool {
        match self.position(id) {
            Some(index) => {
                self.scripts[index] = script;
                true
            }
            None => {
                debug!("Dropping update for script {} that is no longer cached", id);
                false
            }
        }
    }

    /// Remove a script; removing an absent script is a no-op.
    pub fn remove(&mut self, id: &ScriptId) -> bool {
        let before = self.scripts.len();
        self.scripts.retain(|s| &s.id != id);

        if self.focused.as_ref() == Some(id) {
            self.focused = None;
        }

        self.scripts.len() != before
    }

    /// Merge job fields from a status report, leaving everything else alone.
    pub fn merge_job_status(&mut self, id: &ScriptId, report: &JobStatusReport) -> bool {
        let Some(script) = self.get_mut(id) else {
            return false;
        };

        script.video_job_status = report.status;
        script.video_job_progress = report.progress.clamp(0.0, 100.0);

        if let Some(path) = &report.final_video_path {
            script.final_video_path = Some(path.clone());
        }

        script.video_job_error = match report.status {
            VideoJobStatus::Failed => Some(
                report
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "Video generation failed".to_string()),
            ),
            _ => None,
        };

        true
    }

    /// Optimistically mark a script's job as queued.
    pub fn mark_queued(&mut self, id: &ScriptId) -> bool {
        match self.get_mut(id) {
            Some(script) => {
                script.mark_queued();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &ScriptId) -> Option<&Script> {
        self.scripts.iter().find(|s| &s.id == id)
    }

    fn get_mut(&mut self, id: &ScriptId) -> Option<&mut Script> {
        self.scripts.iter_mut().find(|s| &s.id == id)
    }

    fn position(&self, id: &ScriptId) -> Option<usize> {
        self.scripts.iter().position(|s| &s.id == id)
    }

    pub fn contains(&self, id: &ScriptId) -> bool {
        self.position(id).is_some()
    }

    pub fn scripts(&self) -> &[Script] {
        &self.scripts
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// Ids of scripts whose job is queued or in progress
    pub fn active_job_ids(&self) -> Vec<ScriptId> {
        self.scripts
            .iter()
            .filter(|s| s.has_active_job())
            .map(|s| s.id.clone())
            .collect()
    }

    pub fn active_job_count(&self) -> usize {
        self.scripts.iter().filter(|s| s.has_active_job()).count()
    }

    pub fn token_balance(&self) -> i64 {
        self.token_balance
    }

    /// Record the balance the service last reported
    pub fn set_token_balance(&mut self, balance: i64) {
        self.token_balance = balance;
    }

    pub fn catalog(&self) -> &CharacterCatalog {
        &self.catalog
    }

    /// Remember which script the view is showing
    pub fn focus(&mut self, id: &ScriptId) -> bool {
        if self.contains(id) {
            self.focused = Some(id.clone());
            true
        } else {
            false
        }
    }

    pub fn focused(&self) -> Option<&ScriptId> {
        self.focused.as_ref()
    }
}

fn copy_job_fields(from: &Script, to: &mut Script) {
    to.video_job_status = from.video_job_status;
    to.video_job_progress = from.video_job_progress;
    to.video_job_error = from.video_job_error.clone();
    to.final_video_path = from.final_video_path.clone();
}

fn warn_on_invariants(script: &Script) {
    let cast = script.selected_characters.len();
    if !(MIN_CHARACTERS..=MAX_CHARACTERS).contains(&cast) {
        warn!("Script {} casts {} characters", script.id, cast);
    }
    if let Some(line) = script.dialogue.iter().find(|l| !script.casts(&l.speaker)) {
        warn!(
            "Script {} has a line spoken by uncast character {}",
            script.id, line.speaker
        );
    }
}
