//! Real-world image search via a custom-search API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::traits::{Candidate, SearchProvider};

const RESULT_LIMIT: usize = 5;

/// Configuration for the web image search provider.
#[derive(Debug, Clone)]
pub struct WebSearchConfig {
    pub base_url: String,
    pub api_key: String,
    /// Search engine id
    pub cx: String,
}

impl WebSearchConfig {
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("WEB_SEARCH_API_KEY").ok()?;
        let cx = std::env::var("WEB_SEARCH_CX").ok()?;
        let base_url = std::env::var("WEB_SEARCH_BASE_URL")
            .unwrap_or_else(|_| "https://www.googleapis.com".to_string());
        Some(Self {
            base_url,
            api_key,
            cx,
        })
    }
}

/// Searches the open web for current, real-world photos.
///
/// Used for segments flagged `needs_real_world_search`: recent events and
/// named people that stock and generative backends cannot supply.
pub struct WebImageSearch {
    config: WebSearchConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Option<Vec<SearchItem>>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
    #[serde(rename = "displayLink")]
    display_link: String,
    image: ItemImage,
}

#[derive(Debug, Deserialize)]
struct ItemImage {
    width: u32,
    height: u32,
}

impl WebImageSearch {
    pub fn new(config: WebSearchConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl SearchProvider for WebImageSearch {
    fn name(&self) -> &'static str {
        "web-image-search"
    }

    async fn search(&self, query: &str) -> ProviderResult<Vec<Candidate>> {
        let url = format!("{}/customsearch/v1", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.config.api_key.as_str()),
                ("cx", self.config.cx.as_str()),
                ("q", query),
                ("searchType", "image"),
                ("num", "10"),
                ("imgSize", "xlarge"),
                ("imgType", "photo"),
                ("safe", "active"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::api(
                response.status().as_u16(),
                response.text().await.unwrap_or_default(),
            ));
        }

        let body: SearchResponse = response.json().await?;
        let candidates: Vec<Candidate> = body
            .items
            .unwrap_or_default()
            .into_iter()
            .filter(|item| {
                // Landscape and at least 720p; rehosting aggregators serve
                // thumbnails behind consent walls, skip them.
                item.image.width > item.image.height
                    && item.image.width >= 1280
                    && item.image.height >= 720
                    && !item.display_link.contains("pinterest")
            })
            .take(RESULT_LIMIT)
            .map(|item| Candidate::image(item.link))
            .collect();

        debug!(query, count = candidates.len(), "web image search done");
        Ok(candidates)
    }
}
