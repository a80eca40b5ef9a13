//! Pre-submitted generative batch.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::traits::{CandidateSource, GenerativeProvider};

/// Kicks off generation for many prompts at once so results are already
/// cooking by the time the per-segment loop reaches them.
///
/// Lookup is by exact prompt text. A prompt that failed to generate simply
/// yields nothing and the caller falls through to the live chain.
#[derive(Default)]
pub struct BatchImageCache {
    pending: Mutex<HashMap<String, JoinHandle<Option<CandidateSource>>>>,
}

impl BatchImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start generation for every prompt that is not already in flight.
    pub async fn submit(&self, provider: Arc<dyn GenerativeProvider>, prompts: &[String]) {
        let mut pending = self.pending.lock().await;
        for prompt in prompts {
            if pending.contains_key(prompt) {
                continue;
            }
            let provider = Arc::clone(&provider);
            let prompt_owned = prompt.clone();
            let handle = tokio::spawn(async move {
                match provider.generate(&prompt_owned).await {
                    Ok(source) => Some(source),
                    Err(err) => {
                        warn!(provider = provider.name(), error = %err, "batched generation failed");
                        None
                    }
                }
            });
            pending.insert(prompt.clone(), handle);
        }
    }

    /// Take the result for one prompt, waiting for it if still in flight.
    /// Each prompt's result can be taken once.
    pub async fn take(&self, prompt: &str) -> Option<CandidateSource> {
        let handle = self.pending.lock().await.remove(prompt)?;
        handle.await.ok().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProviderError, ProviderResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingGen {
        calls: AtomicU32,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl GenerativeProvider for CountingGen {
        fn name(&self) -> &'static str {
            "counting-gen"
        }

        async fn generate(&self, prompt: &str) -> ProviderResult<CandidateSource> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if Some(prompt) == self.fail_on {
                return Err(ProviderError::Empty);
            }
            Ok(CandidateSource::Url(format!("https://gen/{prompt}")))
        }
    }

    #[tokio::test]
    async fn test_submit_once_take_each() {
        let gen = Arc::new(CountingGen {
            calls: AtomicU32::new(0),
            fail_on: None,
        });
        let cache = BatchImageCache::new();
        let prompts = vec!["a".to_string(), "b".to_string()];
        cache.submit(gen.clone(), &prompts).await;
        // Re-submitting must not start duplicate work.
        cache.submit(gen.clone(), &prompts).await;

        assert!(cache.take("a").await.is_some());
        assert!(cache.take("b").await.is_some());
        assert!(cache.take("a").await.is_none());
        assert_eq!(gen.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_prompt_yields_none() {
        let gen = Arc::new(CountingGen {
            calls: AtomicU32::new(0),
            fail_on: Some("bad"),
        });
        let cache = BatchImageCache::new();
        cache.submit(gen, &["bad".to_string()]).await;
        assert!(cache.take("bad").await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_prompt_is_none() {
        let cache = BatchImageCache::new();
        assert!(cache.take("never submitted").await.is_none());
    }
}
