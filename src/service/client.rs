use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Settings;
use crate::script::{Character, DialogueLine, Script, ScriptId};
use crate::service::error::ServiceResult;
use crate::service::http::HttpScriptService;
use crate::service::types::{JobStatusReport, ScriptListing, VideoSubmission};
use crate::{ReelError, Result};

/// Operations the workflow consumes from the script/video backend.
///
/// Token debits happen on the service side as an effect of
/// `submit_video_generation`; clients only read the balance.
#[async_trait]
pub trait ScriptService: Send + Sync {
    async fn list_scripts(&self) -> ServiceResult<ScriptListing>;

    async fn list_characters(&self) -> ServiceResult<Vec<Character>>;

    /// Replace the whole dialogue of a script.
    async fn update_script_dialogue(
        &self,
        id: &ScriptId,
        dialogue: &[DialogueLine],
    ) -> ServiceResult<Script>;

    async fn delete_script(&self, id: &ScriptId) -> ServiceResult<()>;

    async fn submit_video_generation(&self, id: &ScriptId) -> ServiceResult<VideoSubmission>;

    async fn get_job_status(&self, id: &ScriptId) -> ServiceResult<JobStatusReport>;
}

/// Build a script service from runtime settings.
pub fn build_service(settings: &Settings) -> Result<Arc<dyn ScriptService>> {
    match settings.service.backend.to_lowercase().as_str() {
        "http" => Ok(Arc::new(HttpScriptService::from_settings(settings)?)),
        other => Err(ReelError::Config(format!(
            "Unsupported service.backend '{}'. Supported backends: http",
            other
        ))),
    }
}
