use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tempfile::TempDir;

use scriptreel::config::Settings;
use scriptreel::script::{
    Character, CharacterId, DialogueLine, JobId, Script, ScriptId, VideoJobStatus,
};
use scriptreel::service::{
    JobStatusReport, ScriptListing, ScriptService, ServiceError, ServiceResult, VideoSubmission,
};
use scriptreel::video::ManualTickSource;
use scriptreel::workflow::WorkflowController;

#[allow(dead_code)]
pub fn run_scriptreel(args: &[&str]) -> Output {
    TestEnv::new().run(args)
}

#[allow(dead_code)]
pub struct TestEnv {
    home: TempDir,
    config: TempDir,
    data: TempDir,
}

#[allow(dead_code)]
impl TestEnv {
    pub fn new() -> Self {
        Self {
            home: tempfile::tempdir().expect("create temporary HOME dir"),
            config: tempfile::tempdir().expect("create temporary XDG config dir"),
            data: tempfile::tempdir().expect("create temporary XDG data dir"),
        }
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_scriptreel"))
            .args(args)
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.config.path())
            .env("XDG_DATA_HOME", self.data.path())
            .env_remove("SCRIPTREEL_API_TOKEN")
            .env_remove("SCRIPTREEL_API_URL")
            .env_remove("RUST_LOG")
            .output()
            .expect("failed to execute scriptreel binary")
    }

    pub fn config_path(&self) -> PathBuf {
        let output = self.run(&["config", "path"]);
        assert!(
            output.status.success(),
            "config path should succeed\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );

        let path = String::from_utf8_lossy(&output.stdout);
        PathBuf::from(path.trim())
    }

    pub fn write_config(&self, contents: &str) {
        let config_path = self.config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).expect("create config parent directory");
        }
        std::fs::write(&config_path, contents).expect("write config file");
    }
}

/// Build a script with the given cast and `(speaker, text)` lines.
#[allow(dead_code)]
pub fn script(id: &str, cast: &[&str], lines: &[(&str, &str)]) -> Script {
    let now = Utc::now();
    Script {
        id: ScriptId::new(id),
        dialogue: lines
            .iter()
            .map(|(speaker, text)| DialogueLine::new(CharacterId::new(*speaker), *text))
            .collect(),
        selected_characters: cast.iter().map(|c| CharacterId::new(*c)).collect(),
        original_prompt: format!("prompt for {}", id),
        created_at: now,
        updated_at: now,
        has_audio: false,
        final_video_path: None,
        video_job_status: VideoJobStatus::None,
        video_job_progress: 0.0,
        video_job_error: None,
    }
}

#[allow(dead_code)]
pub fn with_status(mut script: Script, status: VideoJobStatus) -> Script {
    script.video_job_status = status;
    if status == VideoJobStatus::Completed {
        script.video_job_progress = 100.0;
        script.final_video_path = Some(format!("/videos/{}.mp4", script.id));
    }
    script
}

#[allow(dead_code)]
pub fn report(status: VideoJobStatus, progress: f32) -> JobStatusReport {
    JobStatusReport::new(status, progress)
}

#[allow(dead_code)]
pub fn id(id: &str) -> ScriptId {
    ScriptId::new(id)
}

#[derive(Default)]
struct FakeState {
    scripts: Vec<Script>,
    characters: Vec<Character>,
    balance: i64,
    reports: HashMap<ScriptId, VecDeque<ServiceResult<JobStatusReport>>>,
    list_failure: Option<u16>,
    update_failure: Option<ServiceError>,
    submit_failure: Option<ServiceError>,
    delete_failure: Option<ServiceError>,
    cost: i64,
}

/// Per-operation request counters
#[derive(Default)]
#[allow(dead_code)]
pub struct CallCounts {
    pub list: AtomicUsize,
    pub characters: AtomicUsize,
    pub update: AtomicUsize,
    pub delete: AtomicUsize,
    pub submit: AtomicUsize,
    pub status: AtomicUsize,
}

/// In-memory script service.
///
/// Status polls pop from a per-script queue of scripted reports; once the
/// queue is empty the script's stored job fields are reported.
#[derive(Clone, Default)]
pub struct FakeService {
    state: Arc<Mutex<FakeState>>,
    pub calls: Arc<CallCounts>,
}

#[allow(dead_code)]
impl FakeService {
    pub fn new(scripts: Vec<Script>, balance: i64) -> Self {
        let service = Self::default();
        {
            let mut state = service.lock();
            state.scripts = scripts;
            state.balance = balance;
            state.cost = 1;
            state.characters = ["alice", "bob", "carol"]
                .iter()
                .map(|c| Character {
                    id: CharacterId::new(*c),
                    name: format!("{}{}", c[..1].to_uppercase(), &c[1..]),
                })
                .collect();
        }
        service
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake service state poisoned")
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn script(&self, id: &ScriptId) -> Option<Script> {
        self.lock().scripts.iter().find(|s| &s.id == id).cloned()
    }

    pub fn balance(&self) -> i64 {
        self.lock().balance
    }

    pub fn push_report(&self, id: &ScriptId, report: JobStatusReport) {
        self.lock()
            .reports
            .entry(id.clone())
            .or_default()
            .push_back(Ok(report));
    }

    pub fn push_report_error(&self, id: &ScriptId, status: u16) {
        self.lock()
            .reports
            .entry(id.clone())
            .or_default()
            .push_back(Err(ServiceError::Status {
                status,
                body: "unavailable".to_string(),
            }));
    }

    /// Change a script behind the client's back.
    pub fn edit_remote(&self, id: &ScriptId, f: impl FnOnce(&mut Script)) {
        if let Some(script) = self.lock().scripts.iter_mut().find(|s| &s.id == id) {
            f(script);
        }
    }

    pub fn remove_remote(&self, id: &ScriptId) {
        self.lock().scripts.retain(|s| &s.id != id);
    }

    pub fn fail_list(&self, status: Option<u16>) {
        self.lock().list_failure = status;
    }

    pub fn fail_next_update(&self, err: ServiceError) {
        self.lock().update_failure = Some(err);
    }

    pub fn fail_next_submit(&self, err: ServiceError) {
        self.lock().submit_failure = Some(err);
    }

    pub fn fail_next_delete(&self, err: ServiceError) {
        self.lock().delete_failure = Some(err);
    }
}

#[async_trait]
impl ScriptService for FakeService {
    async fn list_scripts(&self) -> ServiceResult<ScriptListing> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        let state = self.lock();
        if let Some(status) = state.list_failure {
            return Err(ServiceError::Status {
                status,
                body: "list failed".to_string(),
            });
        }
        Ok(ScriptListing {
            scripts: state.scripts.clone(),
            user_token_balance: state.balance,
        })
    }

    async fn list_characters(&self) -> ServiceResult<Vec<Character>> {
        self.calls.characters.fetch_add(1, Ordering::SeqCst);
        Ok(self.lock().characters.clone())
    }

    async fn update_script_dialogue(
        &self,
        id: &ScriptId,
        dialogue: &[DialogueLine],
    ) -> ServiceResult<Script> {
        self.calls.update.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if let Some(err) = state.update_failure.take() {
            return Err(err);
        }
        let script = state
            .scripts
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
        script.dialogue = dialogue.to_vec();
        script.updated_at = Utc::now();
        Ok(script.clone())
    }

    async fn delete_script(&self, id: &ScriptId) -> ServiceResult<()> {
        self.calls.delete.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if let Some(err) = state.delete_failure.take() {
            return Err(err);
        }
        let before = state.scripts.len();
        state.scripts.retain(|s| &s.id != id);
        if state.scripts.len() == before {
            return Err(ServiceError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn submit_video_generation(&self, id: &ScriptId) -> ServiceResult<VideoSubmission> {
        self.calls.submit.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if let Some(err) = state.submit_failure.take() {
            return Err(err);
        }
        if state.balance < state.cost {
            return Err(ServiceError::InsufficientTokens("balance too low".to_string()));
        }
        state.balance -= state.cost;

        let script = state
            .scripts
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
        script.video_job_status = VideoJobStatus::Queued;
        script.video_job_progress = 0.0;
        script.video_job_error = None;

        Ok(VideoSubmission {
            job_id: JobId::new(uuid::Uuid::new_v4().to_string()),
            status: VideoJobStatus::Queued,
        })
    }

    async fn get_job_status(&self, id: &ScriptId) -> ServiceResult<JobStatusReport> {
        self.calls.status.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        let scripted = state.reports.get_mut(id).and_then(VecDeque::pop_front);

        match scripted {
            Some(Ok(report)) => {
                if let Some(script) = state.scripts.iter_mut().find(|s| &s.id == id) {
                    script.video_job_status = report.status;
                    script.video_job_progress = report.progress;
                    if report.final_video_path.is_some() {
                        script.final_video_path = report.final_video_path.clone();
                    }
                    script.video_job_error = report.error_message.clone();
                }
                Ok(report)
            }
            Some(Err(err)) => Err(err),
            None => state
                .scripts
                .iter()
                .find(|s| &s.id == id)
                .map(JobStatusReport::from_script)
                .ok_or_else(|| ServiceError::NotFound(id.to_string())),
        }
    }
}

/// Controller wired to a fake service and a manual tick source
#[allow(dead_code)]
pub struct Harness {
    pub service: FakeService,
    pub ticks: ManualTickSource,
    pub controller: WorkflowController,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(scripts: Vec<Script>, balance: i64) -> Self {
        Self::with_settings(scripts, balance, Settings::default())
    }

    pub fn with_settings(scripts: Vec<Script>, balance: i64, settings: Settings) -> Self {
        let service = FakeService::new(scripts, balance);
        let ticks = ManualTickSource::new();
        let controller =
            WorkflowController::new(Arc::new(service.clone()), &settings, Arc::new(ticks.clone()));
        Self {
            service,
            ticks,
            controller,
        }
    }

    /// Build and load in one go.
    pub async fn loaded(scripts: Vec<Script>, balance: i64) -> Self {
        let mut harness = Self::new(scripts, balance);
        harness
            .controller
            .load()
            .await
            .expect("initial load should succeed");
        harness
    }

    /// Fire one manual tick and run the resulting poll.
    pub async fn tick(&mut self) -> scriptreel::video::PollReport {
        assert!(self.ticks.fire(), "polling loop should be running");
        self.controller.next_poll().await
    }
}
