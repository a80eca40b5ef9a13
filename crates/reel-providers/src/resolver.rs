//! The asset resolution fallback chain.

use std::path::Path;
use std::sync::Arc;

use reel_media::{download_to_dir, fix_if_broken};
use reel_models::{AssetKind, ResolvedAsset, Segment};
use tracing::{debug, info, warn};
use url::Url;

use crate::batch::BatchImageCache;
use crate::error::ProviderResult;
use crate::traits::{Candidate, CandidateSource, GenerativeProvider, SearchProvider};

/// Outcome of one segment's resolution.
#[derive(Debug, PartialEq)]
pub enum Resolution {
    Resolved(ResolvedAsset),
    /// Every applicable provider failed. The job goes on without a visual
    /// for this segment.
    Unresolved,
}

/// Tries providers in fixed priority order until one yields a local file.
///
/// Order: real-world web search (only when routed there), the pre-submitted
/// generative batch, each live generative backend, then stock photos as the
/// last resort. A provider failure or a failed download both mean "next".
pub struct AssetResolver {
    web_search: Option<Arc<dyn SearchProvider>>,
    generative: Vec<Arc<dyn GenerativeProvider>>,
    stock: Option<Arc<dyn SearchProvider>>,
    client: reqwest::Client,
}

impl AssetResolver {
    pub fn new(
        web_search: Option<Arc<dyn SearchProvider>>,
        generative: Vec<Arc<dyn GenerativeProvider>>,
        stock: Option<Arc<dyn SearchProvider>>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            web_search,
            generative,
            stock,
            client,
        }
    }

    /// Resolve a visual for `segment`, writing media under `dir` with file
    /// names derived from `stem`. On success `segment.resolved` is set;
    /// search candidates are recorded on the segment either way.
    pub async fn resolve(
        &self,
        dir: &Path,
        stem: &str,
        segment: &mut Segment,
        cache: Option<&BatchImageCache>,
    ) -> Resolution {
        let description = segment.visual_description.clone();
        let mut attempt = 0u32;

        if segment.needs_real_world_search {
            if let Some(provider) = &self.web_search {
                if let Some(asset) = self
                    .try_search(provider.as_ref(), &description, dir, stem, &mut attempt, segment)
                    .await
                {
                    segment.resolved = Some(asset.clone());
                    return Resolution::Resolved(asset);
                }
            }
        }

        if let Some(cache) = cache {
            if let Some(source) = cache.take(&description).await {
                attempt += 1;
                match self
                    .materialize_source(dir, &format!("{stem}-{attempt}"), source)
                    .await
                {
                    Ok(asset) => {
                        debug!(stem, "resolved from generative batch");
                        segment.resolved = Some(asset.clone());
                        return Resolution::Resolved(asset);
                    }
                    Err(err) => warn!(stem, error = %err, "batched result failed to materialize"),
                }
            }
        }

        for provider in &self.generative {
            attempt += 1;
            let result: ProviderResult<ResolvedAsset> = async {
                let source = provider.generate(&description).await?;
                self.materialize_source(dir, &format!("{stem}-{attempt}"), source)
                    .await
            }
            .await;
            match result {
                Ok(asset) => {
                    debug!(stem, provider = provider.name(), "resolved via generation");
                    segment.resolved = Some(asset.clone());
                    return Resolution::Resolved(asset);
                }
                Err(err) => {
                    warn!(stem, provider = provider.name(), error = %err, "generative provider failed")
                }
            }
        }

        if let Some(provider) = &self.stock {
            if let Some(asset) = self
                .try_search(provider.as_ref(), &description, dir, stem, &mut attempt, segment)
                .await
            {
                segment.resolved = Some(asset.clone());
                return Resolution::Resolved(asset);
            }
        }

        info!(stem, description, "no provider produced an asset");
        Resolution::Unresolved
    }

    async fn try_search(
        &self,
        provider: &dyn SearchProvider,
        query: &str,
        dir: &Path,
        stem: &str,
        attempt: &mut u32,
        segment: &mut Segment,
    ) -> Option<ResolvedAsset> {
        let candidates = match provider.search(query).await {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(provider = provider.name(), error = %err, "search failed");
                return None;
            }
        };

        segment
            .alternate_candidates
            .extend(candidates.iter().map(|c| c.url.clone()));

        for Candidate { url, kind } in candidates {
            *attempt += 1;
            match self
                .materialize_url(dir, &format!("{stem}-{attempt}"), &url, kind)
                .await
            {
                Ok(asset) => {
                    debug!(stem, provider = provider.name(), url, "resolved via search");
                    return Some(asset);
                }
                Err(err) => warn!(url, error = %err, "candidate failed to materialize"),
            }
        }
        None
    }

    async fn materialize_url(
        &self,
        dir: &Path,
        stem: &str,
        url: &str,
        kind: AssetKind,
    ) -> ProviderResult<ResolvedAsset> {
        let fallback_ext = match kind {
            AssetKind::Image => "jpg",
            AssetKind::Video => "mp4",
        };
        let mut path = download_to_dir(&self.client, url, dir, stem, fallback_ext).await?;
        if kind == AssetKind::Video {
            path = fix_if_broken(&path).await?;
        }
        Ok(ResolvedAsset {
            path: path.to_string_lossy().into_owned(),
            kind,
        })
    }

    async fn materialize_source(
        &self,
        dir: &Path,
        stem: &str,
        source: CandidateSource,
    ) -> ProviderResult<ResolvedAsset> {
        match source {
            CandidateSource::Url(url) => {
                let kind = kind_for_url(&url);
                self.materialize_url(dir, stem, &url, kind).await
            }
            CandidateSource::Bytes { data, ext } => {
                let path = dir.join(format!("{stem}.{ext}"));
                tokio::fs::write(&path, &data).await?;
                let kind = if ext == "mp4" {
                    AssetKind::Video
                } else {
                    AssetKind::Image
                };
                Ok(ResolvedAsset {
                    path: path.to_string_lossy().into_owned(),
                    kind,
                })
            }
        }
    }

    /// Materialize a motion provider's output next to the still it animates.
    pub async fn materialize_clip(
        &self,
        dir: &Path,
        stem: &str,
        source: CandidateSource,
    ) -> ProviderResult<ResolvedAsset> {
        self.materialize_source(dir, stem, source).await
    }
}

/// Classify a provider URL by the extension of its path component. Signed
/// URLs carry query strings, so the raw string cannot be inspected directly.
fn kind_for_url(url: &str) -> AssetKind {
    let is_video = Url::parse(url)
        .ok()
        .and_then(|u| {
            Path::new(u.path())
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_lowercase)
        })
        .is_some_and(|ext| matches!(ext.as_str(), "mp4" | "webm" | "mov"));
    if is_video {
        AssetKind::Video
    } else {
        AssetKind::Image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use async_trait::async_trait;
    use reel_models::SegmentKind;
    use std::sync::atomic::{AtomicU32, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedSearch {
        urls: Vec<String>,
    }

    #[async_trait]
    impl SearchProvider for FixedSearch {
        fn name(&self) -> &'static str {
            "fixed-search"
        }
        async fn search(&self, _query: &str) -> ProviderResult<Vec<Candidate>> {
            Ok(self.urls.iter().map(Candidate::image).collect())
        }
    }

    struct FixedGen {
        result: Option<String>,
        calls: AtomicU32,
    }

    #[async_trait]
    impl GenerativeProvider for FixedGen {
        fn name(&self) -> &'static str {
            "fixed-gen"
        }
        async fn generate(&self, _prompt: &str) -> ProviderResult<CandidateSource> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Some(url) => Ok(CandidateSource::Url(url.clone())),
                None => Err(ProviderError::Empty),
            }
        }
    }

    async fn serve_image(server: &MockServer, at: &str) {
        Mock::given(method("GET"))
            .and(path(at.to_string()))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg")
                    .set_body_bytes(vec![1u8, 2, 3]),
            )
            .mount(server)
            .await;
    }

    fn segment(real_world: bool) -> Segment {
        let mut s = Segment::new("some words", SegmentKind::Literal, "a lighthouse at dusk");
        s.needs_real_world_search = real_world;
        s
    }

    #[test]
    fn test_url_kind_ignores_query_string() {
        assert_eq!(
            kind_for_url("https://cdn.example/clips/clip.mp4?sig=abc123"),
            AssetKind::Video
        );
        assert_eq!(
            kind_for_url("https://cdn.example/stills/frame.jpg?sig=abc123"),
            AssetKind::Image
        );
        assert_eq!(kind_for_url("https://cdn.example/render/output"), AssetKind::Image);
    }

    #[tokio::test]
    async fn test_broken_candidate_falls_through_to_next() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken.jpg"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        serve_image(&server, "/good.jpg").await;

        let search = Arc::new(FixedSearch {
            urls: vec![
                format!("{}/broken.jpg", server.uri()),
                format!("{}/good.jpg", server.uri()),
            ],
        });
        let resolver = AssetResolver::new(Some(search), vec![], None, reqwest::Client::new());

        let dir = tempfile::tempdir().unwrap();
        let mut seg = segment(true);
        let resolution = resolver.resolve(dir.path(), "seg0", &mut seg, None).await;
        match resolution {
            Resolution::Resolved(asset) => {
                assert_eq!(asset.kind, AssetKind::Image);
                assert!(asset.path.contains("seg0-2"));
            }
            Resolution::Unresolved => panic!("expected resolution"),
        }
        // Both candidates recorded for later reuse.
        assert_eq!(seg.alternate_candidates.len(), 2);
        assert!(seg.resolved.is_some());
    }

    #[tokio::test]
    async fn test_generative_fallback_after_search_exhausted() {
        let server = MockServer::start().await;
        serve_image(&server, "/gen.jpg").await;

        let search = Arc::new(FixedSearch { urls: vec![] });
        let gen = Arc::new(FixedGen {
            result: Some(format!("{}/gen.jpg", server.uri())),
            calls: AtomicU32::new(0),
        });
        let resolver = AssetResolver::new(
            Some(search),
            vec![gen.clone()],
            None,
            reqwest::Client::new(),
        );

        let dir = tempfile::tempdir().unwrap();
        let mut seg = segment(true);
        let resolution = resolver.resolve(dir.path(), "seg1", &mut seg, None).await;
        assert!(matches!(resolution, Resolution::Resolved(_)));
        assert_eq!(gen.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_search_skipped_without_real_world_routing() {
        let server = MockServer::start().await;
        serve_image(&server, "/gen.jpg").await;

        // The search provider would panic the test if consulted; give it a
        // URL that is never served so any use shows up as a failure.
        let search = Arc::new(FixedSearch {
            urls: vec!["https://unreachable.invalid/x.jpg".to_string()],
        });
        let gen = Arc::new(FixedGen {
            result: Some(format!("{}/gen.jpg", server.uri())),
            calls: AtomicU32::new(0),
        });
        let resolver = AssetResolver::new(Some(search), vec![gen], None, reqwest::Client::new());

        let dir = tempfile::tempdir().unwrap();
        let mut seg = segment(false);
        let resolution = resolver.resolve(dir.path(), "seg2", &mut seg, None).await;
        assert!(matches!(resolution, Resolution::Resolved(_)));
        assert!(seg.alternate_candidates.is_empty());
    }

    #[tokio::test]
    async fn test_stock_is_last_resort() {
        let server = MockServer::start().await;
        serve_image(&server, "/stock.jpg").await;

        let gen = Arc::new(FixedGen {
            result: None,
            calls: AtomicU32::new(0),
        });
        let stock = Arc::new(FixedSearch {
            urls: vec![format!("{}/stock.jpg", server.uri())],
        });
        let resolver = AssetResolver::new(None, vec![gen.clone()], Some(stock), reqwest::Client::new());

        let dir = tempfile::tempdir().unwrap();
        let mut seg = segment(false);
        let resolution = resolver.resolve(dir.path(), "seg3", &mut seg, None).await;
        assert!(matches!(resolution, Resolution::Resolved(_)));
        assert_eq!(gen.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unresolved_when_chain_exhausted() {
        let gen = Arc::new(FixedGen {
            result: None,
            calls: AtomicU32::new(0),
        });
        let resolver = AssetResolver::new(None, vec![gen], None, reqwest::Client::new());

        let dir = tempfile::tempdir().unwrap();
        let mut seg = segment(false);
        let resolution = resolver.resolve(dir.path(), "seg4", &mut seg, None).await;
        assert_eq!(resolution, Resolution::Unresolved);
        assert!(seg.resolved.is_none());
    }

    #[tokio::test]
    async fn test_batch_cache_beats_live_generation() {
        let server = MockServer::start().await;
        serve_image(&server, "/batched.jpg").await;

        let batch_gen = Arc::new(FixedGen {
            result: Some(format!("{}/batched.jpg", server.uri())),
            calls: AtomicU32::new(0),
        });
        let live_gen = Arc::new(FixedGen {
            result: Some(format!("{}/batched.jpg", server.uri())),
            calls: AtomicU32::new(0),
        });

        let cache = BatchImageCache::new();
        cache
            .submit(batch_gen.clone(), &["a lighthouse at dusk".to_string()])
            .await;

        let resolver =
            AssetResolver::new(None, vec![live_gen.clone()], None, reqwest::Client::new());
        let dir = tempfile::tempdir().unwrap();
        let mut seg = segment(false);
        let resolution = resolver
            .resolve(dir.path(), "seg5", &mut seg, Some(&cache))
            .await;
        assert!(matches!(resolution, Resolution::Resolved(_)));
        assert_eq!(live_gen.calls.load(Ordering::SeqCst), 0);
    }
}
