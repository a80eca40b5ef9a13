//! Task-based generative image backend: submit, then poll.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::poll::{poll_until_terminal, PollOutcome};
use crate::traits::{CandidateSource, GenerativeProvider};

/// Configuration for the task-based image generator.
#[derive(Debug, Clone)]
pub struct TaskImageConfig {
    pub base_url: String,
    pub api_key: String,
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl TaskImageConfig {
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("IMAGE_TASK_API_KEY").ok()?;
        let base_url = std::env::var("IMAGE_TASK_BASE_URL")
            .unwrap_or_else(|_| "https://api.freepik.com".to_string());
        Some(Self {
            base_url,
            api_key,
            poll_interval: Duration::from_secs(3),
            max_polls: 30,
        })
    }
}

/// First-choice generative backend. Generation is asynchronous on the
/// provider side, so a submit returns a task id that is polled until the
/// image URL appears.
pub struct TaskImageGen {
    config: TaskImageConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    data: SubmitData,
}

#[derive(Debug, Deserialize)]
struct SubmitData {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    data: StatusData,
}

#[derive(Debug, Deserialize)]
struct StatusData {
    status: String,
    #[serde(default)]
    generated: Vec<String>,
}

impl TaskImageGen {
    pub fn new(config: TaskImageConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    async fn submit(&self, prompt: &str) -> ProviderResult<String> {
        let url = format!("{}/v1/ai/text-to-image", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .json(&json!({
                "prompt": prompt,
                "aspect_ratio": "widescreen_16_9",
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::api(
                response.status().as_u16(),
                response.text().await.unwrap_or_default(),
            ));
        }

        let body: SubmitResponse = response.json().await?;
        Ok(body.data.task_id)
    }

    async fn poll_once(&self, task_id: &str) -> ProviderResult<PollOutcome<String>> {
        let url = format!("{}/v1/ai/text-to-image/{}", self.config.base_url, task_id);
        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::api(
                response.status().as_u16(),
                response.text().await.unwrap_or_default(),
            ));
        }

        let body: StatusResponse = response.json().await?;
        match body.data.status.as_str() {
            "COMPLETED" => body
                .data
                .generated
                .into_iter()
                .next()
                .map(PollOutcome::Ready)
                .ok_or(ProviderError::Empty),
            "FAILED" => Err(ProviderError::TaskFailed(format!("task {task_id} failed"))),
            _ => Ok(PollOutcome::Pending),
        }
    }
}

#[async_trait]
impl GenerativeProvider for TaskImageGen {
    fn name(&self) -> &'static str {
        "task-image-gen"
    }

    async fn generate(&self, prompt: &str) -> ProviderResult<CandidateSource> {
        let task_id = self.submit(prompt).await?;
        debug!(task_id, "submitted generation task");

        let url = poll_until_terminal(self.config.poll_interval, self.config.max_polls, || {
            self.poll_once(&task_id)
        })
        .await?;
        Ok(CandidateSource::Url(url))
    }
}
