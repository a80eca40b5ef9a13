//! Shared poll-until-terminal helper for long-running provider tasks.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

/// One poll observation.
pub enum PollOutcome<T> {
    /// Task finished, value available
    Ready(T),
    /// Task still running, poll again
    Pending,
}

/// Poll `op` at a fixed interval until it reports ready.
///
/// A bounded loop, never recursion. Exceeding `max_attempts` yields
/// `PollExhausted`, which callers treat as a provider failure rather than
/// a crash. Errors from `op` itself (task failed, HTTP error) end the loop
/// immediately.
pub async fn poll_until_terminal<T, F, Fut>(
    interval: Duration,
    max_attempts: u32,
    mut op: F,
) -> ProviderResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<PollOutcome<T>>>,
{
    for attempt in 1..=max_attempts {
        match op().await? {
            PollOutcome::Ready(value) => return Ok(value),
            PollOutcome::Pending => {
                debug!(attempt, max_attempts, "provider task still pending");
                if attempt < max_attempts {
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }
    Err(ProviderError::PollExhausted {
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_ready_after_some_polls() {
        let polls = AtomicU32::new(0);
        let result = poll_until_terminal(Duration::from_millis(1), 10, || async {
            let n = polls.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= 3 {
                Ok(PollOutcome::Ready(n))
            } else {
                Ok(PollOutcome::Pending)
            }
        })
        .await
        .unwrap();
        assert_eq!(result, 3);
    }

    #[tokio::test]
    async fn test_exhaustion_is_an_error() {
        let result: ProviderResult<()> =
            poll_until_terminal(Duration::from_millis(1), 4, || async {
                Ok(PollOutcome::Pending)
            })
            .await;
        assert!(matches!(
            result,
            Err(ProviderError::PollExhausted { attempts: 4 })
        ));
    }

    #[tokio::test]
    async fn test_task_failure_stops_polling() {
        let polls = AtomicU32::new(0);
        let result: ProviderResult<()> =
            poll_until_terminal(Duration::from_millis(1), 10, || async {
                polls.fetch_add(1, Ordering::SeqCst);
                Err(ProviderError::TaskFailed("bad prompt".into()))
            })
            .await;
        assert!(matches!(result, Err(ProviderError::TaskFailed(_))));
        assert_eq!(polls.load(Ordering::SeqCst), 1);
    }
}
