//! Transcription client with word-level time offsets.

use std::path::Path;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reel_models::TranscriptWord;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{ServiceError, ServiceResult};

/// Produces word-level timestamps for synthesized narration.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        audio_path: &Path,
        language_code: &str,
        hints: &[String],
    ) -> ServiceResult<Vec<TranscriptWord>>;
}

/// Configuration for the STT service.
#[derive(Debug, Clone)]
pub struct SttConfig {
    pub base_url: String,
    pub api_key: String,
}

impl SttConfig {
    pub fn from_env() -> ServiceResult<Self> {
        let api_key = std::env::var("SPEECH_API_KEY")
            .map_err(|_| ServiceError::invalid_response("SPEECH_API_KEY is not set"))?;
        let base_url = std::env::var("STT_BASE_URL")
            .unwrap_or_else(|_| "https://speech.googleapis.com".to_string());
        Ok(Self { base_url, api_key })
    }
}

pub struct HttpSttClient {
    config: SttConfig,
    client: reqwest::Client,
}

/// The service emits durations either as `"4.300s"` strings or as
/// `{seconds, nanos}` objects, depending on transport. Accept both.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireOffset {
    Text(String),
    Parts {
        #[serde(default)]
        seconds: i64,
        #[serde(default)]
        nanos: i64,
    },
}

impl WireOffset {
    fn to_seconds(&self) -> f64 {
        match self {
            WireOffset::Text(s) => s.trim_end_matches('s').parse::<f64>().unwrap_or(0.0),
            WireOffset::Parts { seconds, nanos } => *seconds as f64 + *nanos as f64 / 1e9,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognizeResult>,
}

#[derive(Debug, Deserialize)]
struct RecognizeResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    words: Vec<WireWord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireWord {
    word: String,
    start_time: Option<WireOffset>,
    end_time: Option<WireOffset>,
}

impl HttpSttClient {
    pub fn new(config: SttConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl Transcriber for HttpSttClient {
    async fn transcribe(
        &self,
        audio_path: &Path,
        language_code: &str,
        hints: &[String],
    ) -> ServiceResult<Vec<TranscriptWord>> {
        let audio = tokio::fs::read(audio_path).await?;
        let url = format!("{}/v1/speech:recognize", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&json!({
                "config": {
                    "encoding": "OGG_OPUS",
                    "sampleRateHertz": 48000,
                    "languageCode": language_code,
                    "enableWordTimeOffsets": true,
                    "speechContexts": [{ "phrases": hints }],
                },
                "audio": { "content": BASE64.encode(&audio) },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::api(
                response.status().as_u16(),
                response.text().await.unwrap_or_default(),
            ));
        }

        let body: RecognizeResponse = response.json().await?;
        // Results arrive per utterance; the words of the first alternative
        // of each, concatenated, cover the whole audio.
        let words: Vec<TranscriptWord> = body
            .results
            .into_iter()
            .filter_map(|r| r.alternatives.into_iter().next())
            .flat_map(|a| a.words)
            .map(|w| TranscriptWord {
                text: w.word,
                start_time: w.start_time.map(|o| o.to_seconds()).unwrap_or(0.0),
                end_time: w.end_time.map(|o| o.to_seconds()).unwrap_or(0.0),
            })
            .collect();

        if words.is_empty() {
            return Err(ServiceError::invalid_response("transcript has no words"));
        }
        debug!(words = words.len(), language_code, "transcription done");
        Ok(words)
    }
}
