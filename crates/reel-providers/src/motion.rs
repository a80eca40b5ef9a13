//! Image-to-video motion backend behind a long-running operation API.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::poll::{poll_until_terminal, PollOutcome};
use crate::traits::{CandidateSource, MotionProvider};

/// Configuration for the motion provider.
#[derive(Debug, Clone)]
pub struct MotionConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl MotionConfig {
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GENAI_API_KEY").ok()?;
        let base_url = std::env::var("GENAI_BASE_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());
        let model = std::env::var("MOTION_MODEL")
            .unwrap_or_else(|_| "veo-3.0-fast-generate-001".to_string());
        Some(Self {
            base_url,
            api_key,
            model,
            // Video generation runs for minutes; poll slowly.
            poll_interval: Duration::from_secs(8),
            max_polls: 40,
        })
    }
}

/// Animates a resolved still into a short clip via a predictLongRunning
/// operation. Entirely optional: callers keep the still on any failure.
pub struct LongRunningMotion {
    config: MotionConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct OperationHandle {
    name: String,
}

#[derive(Debug, Deserialize)]
struct OperationStatus {
    #[serde(default)]
    done: bool,
    response: Option<OperationResponse>,
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSample {
    video: Option<GeneratedVideo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedVideo {
    uri: Option<String>,
    bytes_base64_encoded: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    message: Option<String>,
}

impl LongRunningMotion {
    pub fn new(config: MotionConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    async fn submit(&self, image_b64: &str, prompt: &str) -> ProviderResult<String> {
        let url = format!(
            "{}/v1beta/models/{}:predictLongRunning",
            self.config.base_url, self.config.model
        );
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&json!({
                "instances": [{
                    "prompt": prompt,
                    "image": { "bytesBase64Encoded": image_b64, "mimeType": "image/jpeg" }
                }]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::api(
                response.status().as_u16(),
                response.text().await.unwrap_or_default(),
            ));
        }

        let body: OperationHandle = response.json().await?;
        Ok(body.name)
    }

    async fn poll_once(&self, operation: &str) -> ProviderResult<PollOutcome<CandidateSource>> {
        let url = format!("{}/v1beta/{}", self.config.base_url, operation);
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::api(
                response.status().as_u16(),
                response.text().await.unwrap_or_default(),
            ));
        }

        let status: OperationStatus = response.json().await?;
        if !status.done {
            return Ok(PollOutcome::Pending);
        }
        if let Some(err) = status.error {
            return Err(ProviderError::TaskFailed(
                err.message.unwrap_or_else(|| "operation failed".to_string()),
            ));
        }

        let video = status
            .response
            .and_then(|r| r.generate_video_response)
            .and_then(|r| r.generated_samples.into_iter().next())
            .and_then(|s| s.video)
            .ok_or(ProviderError::Empty)?;

        if let Some(uri) = video.uri {
            return Ok(PollOutcome::Ready(CandidateSource::Url(uri)));
        }
        let encoded = video.bytes_base64_encoded.ok_or(ProviderError::Empty)?;
        let data = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| ProviderError::invalid_payload(format!("bad base64 video: {e}")))?;
        Ok(PollOutcome::Ready(CandidateSource::Bytes {
            data,
            ext: "mp4",
        }))
    }
}

#[async_trait]
impl MotionProvider for LongRunningMotion {
    fn name(&self) -> &'static str {
        "long-running-motion"
    }

    async fn animate(
        &self,
        image_path: &Path,
        motion_prompt: &str,
    ) -> ProviderResult<CandidateSource> {
        let bytes = tokio::fs::read(image_path).await?;
        let image_b64 = BASE64.encode(&bytes);

        let operation = self.submit(&image_b64, motion_prompt).await?;
        debug!(operation, "submitted motion operation");

        poll_until_terminal(self.config.poll_interval, self.config.max_polls, || {
            self.poll_once(&operation)
        })
        .await
    }
}
