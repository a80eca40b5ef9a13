//! Synchronous generative backends returning inline image bytes.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use crate::error::{ProviderError, ProviderResult};
use crate::traits::{CandidateSource, GenerativeProvider};

/// Shared configuration for the inline generative backends.
#[derive(Debug, Clone)]
pub struct InlineGenConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl InlineGenConfig {
    pub fn from_env(model_var: &str, default_model: &str) -> Option<Self> {
        let api_key = std::env::var("GENAI_API_KEY").ok()?;
        let base_url = std::env::var("GENAI_BASE_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());
        let model = std::env::var(model_var).unwrap_or_else(|_| default_model.to_string());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

fn ext_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

/// Second-choice generative backend: a diffusion model behind a `predict`
/// endpoint, returning one base64 image per sample.
pub struct PredictImageGen {
    config: InlineGenConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

impl PredictImageGen {
    pub fn new(config: InlineGenConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl GenerativeProvider for PredictImageGen {
    fn name(&self) -> &'static str {
        "predict-image-gen"
    }

    async fn generate(&self, prompt: &str) -> ProviderResult<CandidateSource> {
        let url = format!(
            "{}/v1beta/models/{}:predict",
            self.config.base_url, self.config.model
        );
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&json!({
                "instances": [{ "prompt": prompt }],
                "parameters": {
                    "sampleCount": 1,
                    "aspectRatio": "16:9",
                    "outputMimeType": "image/jpeg",
                    "personGeneration": "allow_all",
                }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::api(
                response.status().as_u16(),
                response.text().await.unwrap_or_default(),
            ));
        }

        let body: PredictResponse = response.json().await?;
        let prediction = body.predictions.into_iter().next().ok_or(ProviderError::Empty)?;
        let encoded = prediction.bytes_base64_encoded.ok_or(ProviderError::Empty)?;
        let data = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| ProviderError::invalid_payload(format!("bad base64 image: {e}")))?;
        Ok(CandidateSource::Bytes {
            data,
            ext: ext_for_mime(prediction.mime_type.as_deref().unwrap_or("image/jpeg")),
        })
    }
}

/// Third-choice generative backend: a multimodal chat model that answers
/// with an inline image part. Slower and chattier than the predict
/// endpoint, but succeeds on prompts the diffusion model refuses.
pub struct ContentImageGen {
    config: InlineGenConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    candidates: Vec<ContentCandidate>,
}

#[derive(Debug, Deserialize)]
struct ContentCandidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: String,
}

impl ContentImageGen {
    pub fn new(config: InlineGenConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl GenerativeProvider for ContentImageGen {
    fn name(&self) -> &'static str {
        "content-image-gen"
    }

    async fn generate(&self, prompt: &str) -> ProviderResult<CandidateSource> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&json!({
                "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
                "generationConfig": { "responseModalities": ["IMAGE", "TEXT"] }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::api(
                response.status().as_u16(),
                response.text().await.unwrap_or_default(),
            ));
        }

        let body: ContentResponse = response.json().await?;
        let inline = body
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.inline_data)
            .ok_or(ProviderError::Empty)?;

        let data = BASE64
            .decode(inline.data.as_bytes())
            .map_err(|e| ProviderError::invalid_payload(format!("bad base64 image: {e}")))?;
        Ok(CandidateSource::Bytes {
            data,
            ext: ext_for_mime(inline.mime_type.as_deref().unwrap_or("image/jpeg")),
        })
    }
}
