//! Video generation requests and the job polling loop

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{PollSource, Settings};
use crate::script::{Script, ScriptId, VideoJobStatus};
use crate::service::{JobStatusReport, ScriptService, ServiceError, VideoSubmission};
use crate::store::ScriptStore;
use crate::video::job::{judge_report, JobPhase, PendingSubmission, ReportDecision};
use crate::video::ticker::{TickSource, Ticker};
use crate::{ReelError, Result};

/// What a single poll changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollReport {
    /// Scripts whose job fields changed
    pub updated: Vec<ScriptId>,
    /// Jobs that finished during this poll
    pub completed: Vec<ScriptId>,
    /// Jobs that failed during this poll, with the service's message
    pub failed: Vec<(ScriptId, String)>,
    /// Requests that failed and will be retried on the next tick
    pub errors: usize,
}

/// Submits render jobs and keeps their status fresh while any is active
pub struct VideoJobTracker {
    ticks: Arc<dyn TickSource>,
    ticker: Option<Box<dyn Ticker>>,
    interval: Duration,
    source: PollSource,
    pending: HashMap<ScriptId, PendingSubmission>,
}

impl VideoJobTracker {
    pub fn new(ticks: Arc<dyn TickSource>, interval: Duration, source: PollSource) -> Self {
        Self {
            ticks,
            ticker: None,
            interval,
            source,
            pending: HashMap::new(),
        }
    }

    pub fn from_settings(settings: &Settings, ticks: Arc<dyn TickSource>) -> Self {
        Self::new(
            ticks,
            settings.video.poll_interval(),
            settings.video.poll_source,
        )
    }

    /// Whether the polling loop is running
    pub fn is_polling(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn phase(&self, script: &Script) -> JobPhase {
        JobPhase::of(script, self.pending.get(&script.id))
    }

    pub fn is_pending(&self, id: &ScriptId) -> bool {
        self.pending.contains_key(id)
    }

    /// Scripts whose submission no poll has confirmed yet
    pub fn pending_ids(&self) -> HashSet<ScriptId> {
        self.pending.keys().cloned().collect()
    }

    /// Submit a render job for a script.
    ///
    /// The token balance is checked before any request goes out. On success
    /// the script is marked queued locally right away, without waiting for
    /// the next poll.
    pub async fn generate(
        &mut self,
        service: &dyn ScriptService,
        store: &mut ScriptStore,
        id: &ScriptId,
        cost: u32,
    ) -> Result<VideoSubmission> {
        let script = store
            .get(id)
            .ok_or_else(|| ReelError::ScriptNotFound(id.clone()))?;
        if script.has_active_job() {
            return Err(ReelError::JobActive(id.clone()));
        }

        let balance = store.token_balance();
        if balance < i64::from(cost) {
            return Err(ReelError::InsufficientTokens { balance, cost });
        }

        let submission = service
            .submit_video_generation(id)
            .await
            .map_err(|e| match e {
                ServiceError::InsufficientTokens(_) => ReelError::InsufficientTokens { balance, cost },
                other => ReelError::Submission(other.to_string()),
            })?;

        info!("Video job {} submitted for script {}", submission.job_id, id);

        // Snapshot the previous outcome before the optimistic reset.
        let pending = store
            .get(id)
            .map(|script| PendingSubmission::new(submission.job_id.clone(), script));
        match pending {
            Some(pending) => {
                store.mark_queued(id);
                self.pending.insert(id.clone(), pending);
            }
            None => {
                debug!("Script {} was removed before its submission returned", id);
            }
        }

        self.sync(store);
        Ok(submission)
    }

    /// Fetch job status once and merge it into the store.
    ///
    /// Request failures are logged and counted, never returned; the next
    /// tick retries them.
    pub async fn poll_once(
        &mut self,
        service: &dyn ScriptService,
        store: &mut ScriptStore,
    ) -> PollReport {
        let mut report = PollReport::default();

        match self.source {
            PollSource::JobStatus => {
                for id in store.active_job_ids() {
                    match service.get_job_status(&id).await {
                        Ok(status) => self.apply(store, &id, status, &mut report),
                        Err(e) => {
                            warn!("Polling job status for script {} failed: {}", id, e);
                            report.errors += 1;
                        }
                    }
                }
            }
            PollSource::ScriptList => match service.list_scripts().await {
                Ok(listing) => {
                    store.set_token_balance(listing.user_token_balance);
                    for script in &listing.scripts {
                        if store.contains(&script.id) {
                            let status = JobStatusReport::from_script(script);
                            self.apply(store, &script.id, status, &mut report);
                        }
                    }
                }
                Err(e) => {
                    warn!("Polling script list failed: {}", e);
                    report.errors += 1;
                }
            },
        }

        self.sync(store);

        debug!(
            "Poll finished: {} updated, {} active, {} errors",
            report.updated.len(),
            store.active_job_count(),
            report.errors
        );
        report
    }

    fn apply(
        &mut self,
        store: &mut ScriptStore,
        id: &ScriptId,
        status: JobStatusReport,
        report: &mut PollReport,
    ) {
        let Some(current) = store.get(id) else {
            debug!("Dropping poll result for removed script {}", id);
            self.pending.remove(id);
            return;
        };

        let before_status = current.video_job_status;
        let before_progress = current.video_job_progress;

        if let ReportDecision::Ignore(reason) =
            judge_report(before_status, self.pending.get(id), &status)
        {
            debug!("Ignoring job report for script {}: {}", id, reason);
            return;
        }

        self.pending.remove(id);
        store.merge_job_status(id, &status);

        let Some(after) = store.get(id) else {
            return;
        };
        if after.video_job_status != before_status || after.video_job_progress != before_progress
        {
            report.updated.push(id.clone());
        }

        if after.video_job_status == before_status {
            return;
        }

        match after.video_job_status {
            VideoJobStatus::Completed => {
                info!(
                    "Video for script {} is ready: {}",
                    id,
                    after.final_video_path.as_deref().unwrap_or("(no path)")
                );
                report.completed.push(id.clone());
            }
            VideoJobStatus::Failed => {
                let message = after.video_job_error.clone().unwrap_or_default();
                warn!("Video for script {} failed: {}", id, message);
                report.failed.push((id.clone(), message));
            }
            other => debug!("Script {} job is now {}", id, other),
        }
    }

    /// Start or stop the polling loop to match the store's active jobs.
    pub fn sync(&mut self, store: &ScriptStore) {
        let active = store.active_job_count() > 0;

        match (active, self.ticker.is_some()) {
            (true, false) => {
                debug!("Starting job polling every {:?}", self.interval);
                self.ticker = Some(self.ticks.start(self.interval));
            }
            (false, true) => {
                debug!("No active video jobs, stopping polling");
                self.ticker = None;
            }
            _ => {}
        }

        self.pending
            .retain(|id, _| store.get(id).map(Script::has_active_job).unwrap_or(false));
    }

    /// Wait for the next poll tick; never resolves while polling is stopped.
    pub async fn wait_tick(&mut self) {
        match self.ticker.as_mut() {
            Some(ticker) => ticker.tick().await,
            None => std::future::pending::<()>().await,
        }
    }

    /// Drop local state for a script that no longer exists.
    pub fn forget(&mut self, id: &ScriptId) {
        self.pending.remove(id);
    }

    /// Stop polling for good, e.g. when the view goes away.
    pub fn stop(&mut self) {
        if self.ticker.take().is_some() {
            debug!("Job polling stopped");
        }
        self.pending.clear();
    }
}
