//! Adapter traits every concrete provider implements.

use async_trait::async_trait;
use reel_models::AssetKind;
use std::path::Path;

use crate::error::ProviderResult;

/// A remote media candidate returned by a search provider, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub url: String,
    pub kind: AssetKind,
}

impl Candidate {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: AssetKind::Image,
        }
    }

    pub fn video(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: AssetKind::Video,
        }
    }
}

/// Where generated media lives: a URL to download, or inline bytes.
#[derive(Debug)]
pub enum CandidateSource {
    Url(String),
    Bytes { data: Vec<u8>, ext: &'static str },
}

/// Query-to-candidates search (web image search, stock search).
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &'static str;

    async fn search(&self, query: &str) -> ProviderResult<Vec<Candidate>>;
}

/// Prompt-to-image generation.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, prompt: &str) -> ProviderResult<CandidateSource>;
}

/// Still image to short video clip.
#[async_trait]
pub trait MotionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn animate(&self, image_path: &Path, motion_prompt: &str)
        -> ProviderResult<CandidateSource>;
}
