//! Stock media search, the chain's last resort.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::traits::{Candidate, SearchProvider};

/// Configuration for the stock search provider.
#[derive(Debug, Clone)]
pub struct StockSearchConfig {
    pub base_url: String,
    pub api_key: String,
    pub per_page: u32,
}

impl StockSearchConfig {
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("STOCK_API_KEY").ok()?;
        let base_url = std::env::var("STOCK_BASE_URL")
            .unwrap_or_else(|_| "https://api.pexels.com".to_string());
        Some(Self {
            base_url,
            api_key,
            per_page: 5,
        })
    }
}

/// Generic stock photo search. Always applicable, always last.
pub struct StockPhotoSearch {
    config: StockSearchConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct PhotoSearchResponse {
    #[serde(default)]
    photos: Vec<StockPhoto>,
}

#[derive(Debug, Deserialize)]
struct StockPhoto {
    src: PhotoSources,
}

#[derive(Debug, Deserialize)]
struct PhotoSources {
    original: String,
    large2x: Option<String>,
}

impl StockPhotoSearch {
    pub fn new(config: StockSearchConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl SearchProvider for StockPhotoSearch {
    fn name(&self) -> &'static str {
        "stock-photo-search"
    }

    async fn search(&self, query: &str) -> ProviderResult<Vec<Candidate>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/search", self.config.base_url);
        let per_page = self.config.per_page.to_string();
        let response = self
            .client
            .get(&url)
            .header("Authorization", &self.config.api_key)
            .query(&[
                ("query", query),
                ("per_page", per_page.as_str()),
                ("orientation", "landscape"),
                ("size", "large"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::api(
                response.status().as_u16(),
                response.text().await.unwrap_or_default(),
            ));
        }

        let body: PhotoSearchResponse = response.json().await?;
        let candidates: Vec<Candidate> = body
            .photos
            .into_iter()
            .map(|p| Candidate::image(p.src.large2x.unwrap_or(p.src.original)))
            .collect();

        debug!(query, count = candidates.len(), "stock photo search done");
        Ok(candidates)
    }
}
