//! Compositor render client.

use std::time::Duration;

use async_trait::async_trait;
use reel_models::RenderRequest;
use serde::Deserialize;
use tracing::info;

use crate::error::{ServiceError, ServiceResult};

/// Hands the assembled timeline to the compositor service.
#[async_trait]
pub trait VideoRenderer: Send + Sync {
    /// Returns the path of the finished video.
    async fn render(&self, request: &RenderRequest) -> ServiceResult<String>;
}

/// Configuration for the renderer service.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub base_url: String,
    /// Rendering a short video takes minutes; the request stays open the
    /// whole time.
    pub timeout: Duration,
}

impl RenderConfig {
    pub fn from_env() -> ServiceResult<Self> {
        let base_url = std::env::var("RENDERER_BASE_URL")
            .map_err(|_| ServiceError::invalid_response("RENDERER_BASE_URL is not set"))?;
        let timeout = std::env::var("RENDERER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(1800));
        Ok(Self { base_url, timeout })
    }
}

pub struct HttpRenderClient {
    config: RenderConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderResponse {
    video_path: String,
}

impl HttpRenderClient {
    pub fn new(config: RenderConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl VideoRenderer for HttpRenderClient {
    async fn render(&self, request: &RenderRequest) -> ServiceResult<String> {
        let url = format!("{}/render", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .timeout(self.config.timeout)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::api(
                response.status().as_u16(),
                response.text().await.unwrap_or_default(),
            ));
        }

        let body: RenderResponse = response.json().await?;
        info!(output = %body.video_path, "render finished");
        Ok(body.video_path)
    }
}
