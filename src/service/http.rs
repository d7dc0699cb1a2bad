use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::config::Settings;
use crate::script::{Character, DialogueLine, Script, ScriptId};
use crate::service::client::ScriptService;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::types::{DialogueUpdate, JobStatusReport, ScriptListing, VideoSubmission};
use crate::{ReelError, Result};

/// Script service reached over its REST API.
pub struct HttpScriptService {
    http: Client,
    base_url: String,
    api_token: String,
}

impl HttpScriptService {
    pub fn new(base_url: &str, api_token: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ReelError::Config(
                "service.base_url is empty. Set it in config or SCRIPTREEL_API_URL.".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReelError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            api_token: api_token.trim().to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            &settings.service.base_url,
            &settings.service.api_token,
            Duration::from_secs(settings.service.timeout_secs),
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let builder = self.http.request(method, url);
        if self.api_token.is_empty() {
            builder
        } else {
            builder.bearer_auth(&self.api_token)
        }
    }
}

/// Turn non-2xx responses into typed errors.
async fn check(response: Response) -> ServiceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::PAYMENT_REQUIRED => ServiceError::InsufficientTokens(body),
        StatusCode::NOT_FOUND => ServiceError::NotFound(body),
        StatusCode::CONFLICT => ServiceError::Conflict(body),
        StatusCode::UNPROCESSABLE_ENTITY => ServiceError::Validation(body),
        other => ServiceError::Status {
            status: other.as_u16(),
            body,
        },
    })
}

/// Parse a checked response body.
async fn decode<T: DeserializeOwned>(response: Response) -> ServiceResult<T> {
    let response = check(response).await?;
    response.json().await.map_err(|e| {
        if e.is_decode() {
            ServiceError::InvalidResponse(e.to_string())
        } else {
            ServiceError::Network(e)
        }
    })
}

#[async_trait]
impl ScriptService for HttpScriptService {
    async fn list_scripts(&self) -> ServiceResult<ScriptListing> {
        let response = self.request(Method::GET, "/scripts").send().await?;
        decode(response).await
    }

    async fn list_characters(&self) -> ServiceResult<Vec<Character>> {
        let response = self.request(Method::GET, "/characters").send().await?;
        decode(response).await
    }

    async fn update_script_dialogue(
        &self,
        id: &ScriptId,
        dialogue: &[DialogueLine],
    ) -> ServiceResult<Script> {
        let body = DialogueUpdate {
            dialogue: dialogue.to_vec(),
        };

        let response = self
            .request(Method::PUT, &format!("/scripts/{}/dialogue", id))
            .json(&body)
            .send()
            .await?;

        let script: Script = decode(response).await?;
        if &script.id != id {
            return Err(ServiceError::InvalidResponse(format!(
                "expected script {} in update response, got {}",
                id, script.id
            )));
        }
        Ok(script)
    }

    async fn delete_script(&self, id: &ScriptId) -> ServiceResult<()> {
        let response = self
            .request(Method::DELETE, &format!("/scripts/{}", id))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn submit_video_generation(&self, id: &ScriptId) -> ServiceResult<VideoSubmission> {
        let response = self
            .request(Method::POST, &format!("/scripts/{}/video", id))
            .send()
            .await?;
        decode(response).await
    }

    async fn get_job_status(&self, id: &ScriptId) -> ServiceResult<JobStatusReport> {
        let response = self
            .request(Method::GET, &format!("/scripts/{}/video/status", id))
            .send()
            .await?;
        decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped_from_base_url() {
        let service =
            HttpScriptService::new("http://localhost:3000/api/", "", Duration::from_secs(5))
                .unwrap();
        assert_eq!(service.base_url, "http://localhost:3000/api");
    }

    #[test]
    fn empty_base_url_is_a_config_error() {
        let err = match HttpScriptService::new("  ", "", Duration::from_secs(5)) {
            Ok(_) => panic!("expected empty base url to be rejected"),
            Err(e) => e,
        };
        assert!(matches!(err, ReelError::Config(_)));
    }
}
