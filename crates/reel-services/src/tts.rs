//! Speech synthesis client.

use std::path::Path;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reel_models::Avatar;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{ServiceError, ServiceResult};

/// Synthesizes the narration audio for a script.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Write OGG/Opus narration audio for `script` to `out_path`.
    async fn synthesize(&self, script: &str, avatar: Avatar, out_path: &Path)
        -> ServiceResult<()>;
}

/// Configuration for the TTS service.
#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub base_url: String,
    pub api_key: String,
}

impl TtsConfig {
    pub fn from_env() -> ServiceResult<Self> {
        let api_key = std::env::var("SPEECH_API_KEY")
            .map_err(|_| ServiceError::invalid_response("SPEECH_API_KEY is not set"))?;
        let base_url = std::env::var("TTS_BASE_URL")
            .unwrap_or_else(|_| "https://texttospeech.googleapis.com".to_string());
        Ok(Self { base_url, api_key })
    }
}

pub struct HttpTtsClient {
    config: TtsConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

impl HttpTtsClient {
    pub fn new(config: TtsConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpTtsClient {
    async fn synthesize(
        &self,
        script: &str,
        avatar: Avatar,
        out_path: &Path,
    ) -> ServiceResult<()> {
        let url = format!("{}/v1/text:synthesize", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&json!({
                "input": { "text": script },
                "voice": {
                    "languageCode": avatar.language_code(),
                    "name": avatar.voice_id(),
                    "ssmlGender": avatar.gender().as_str(),
                },
                "audioConfig": { "audioEncoding": "OGG_OPUS" },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::api(
                response.status().as_u16(),
                response.text().await.unwrap_or_default(),
            ));
        }

        let body: SynthesizeResponse = response.json().await?;
        let audio = BASE64
            .decode(body.audio_content.as_bytes())
            .map_err(|e| ServiceError::invalid_response(format!("bad base64 audio: {e}")))?;
        if audio.is_empty() {
            return Err(ServiceError::invalid_response("empty audio content"));
        }

        tokio::fs::write(out_path, &audio).await?;
        debug!(voice = avatar.voice_id(), bytes = audio.len(), path = %out_path.display(), "synthesized narration");
        Ok(())
    }
}
