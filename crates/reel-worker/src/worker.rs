//! The polling worker loop: claim, dispatch, purge, drain.

use std::sync::Arc;

use reel_models::{JobStatus, JobUpdate};
use reel_store::JobStore;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::WorkerConfig;
use crate::pipeline::JobProcessor;
use crate::progress::ProgressReporter;

/// Single-process job scheduler.
///
/// Each tick claims pending jobs FIFO up to the free-slot count and spawns
/// them onto the processor; claiming happens before dispatch so a job is
/// never picked up twice. Shutdown stops claiming and drains what is in
/// flight.
pub struct WorkerLoop {
    store: Arc<dyn JobStore>,
    processor: Arc<dyn JobProcessor>,
    config: WorkerConfig,
    shutdown: watch::Receiver<bool>,
}

impl WorkerLoop {
    pub fn new(
        store: Arc<dyn JobStore>,
        processor: Arc<dyn JobProcessor>,
        config: WorkerConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            store,
            processor,
            config,
            shutdown,
        }
    }

    pub async fn run(self) {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_jobs));
        let mut active = JoinSet::new();
        let mut shutdown = self.shutdown.clone();
        let mut poll = tokio::time::interval(self.config.poll_interval);
        let mut purge = tokio::time::interval(self.config.purge_interval);
        // The first interval tick fires immediately; skip the purge one so
        // startup does not race a fresh store.
        purge.tick().await;

        info!(
            max_jobs = self.config.max_concurrent_jobs,
            poll_ms = self.config.poll_interval.as_millis() as u64,
            "worker loop started"
        );

        loop {
            tokio::select! {
                _ = poll.tick() => {
                    // Reap finished tasks so the active count stays honest.
                    while active.try_join_next().is_some() {}

                    if *shutdown.borrow() {
                        break;
                    }
                    self.claim_and_dispatch(&semaphore, &mut active).await;
                }
                _ = purge.tick() => {
                    let max_age = chrono::Duration::from_std(self.config.purge_max_age)
                        .unwrap_or_else(|_| chrono::Duration::hours(24));
                    match self.store.purge_older_than(max_age).await {
                        Ok(0) => {}
                        Ok(n) => info!(purged = n, "purged old job records"),
                        Err(err) => warn!(error = %err, "purge failed"),
                    }
                }
                changed = shutdown.changed() => {
                    // A dropped sender counts as a shutdown request.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(in_flight = active.len(), "draining active jobs");
        let drain = async {
            while active.join_next().await.is_some() {}
        };
        if tokio::time::timeout(self.config.shutdown_timeout, drain)
            .await
            .is_err()
        {
            warn!("shutdown timeout elapsed, abandoning in-flight jobs");
            active.abort_all();
        }
        info!("worker loop stopped");
    }

    async fn claim_and_dispatch(
        &self,
        semaphore: &Arc<Semaphore>,
        active: &mut JoinSet<()>,
    ) {
        let free = semaphore.available_permits();
        if free == 0 {
            return;
        }

        let pending = match self.store.list_by_status(JobStatus::Pending).await {
            Ok(pending) => pending,
            Err(err) => {
                warn!(error = %err, "failed to list pending jobs");
                return;
            }
        };

        for record in pending.into_iter().take(free) {
            // Claim before dispatch: the record is Running before any work
            // starts, so the next tick cannot pick it up again.
            let record = match self.store.update(&record.id, JobUpdate::claimed()).await {
                Ok(record) => record,
                Err(err) => {
                    warn!(job_id = %record.id, error = %err, "failed to claim job");
                    continue;
                }
            };

            let permit = match Arc::clone(semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            let store = Arc::clone(&self.store);
            let processor = Arc::clone(&self.processor);

            active.spawn(async move {
                let _permit = permit;
                let id = record.id.clone();
                info!(job_id = %id, "job started");

                let reporter = ProgressReporter::new(Arc::clone(&store), id.clone());
                let update = match processor.process(&record, &reporter).await {
                    Ok(output) => {
                        info!(job_id = %id, output, "job finished");
                        JobUpdate::done(output)
                    }
                    Err(err) => {
                        error!(job_id = %id, error = %err, "job failed");
                        JobUpdate::failed(err.to_string())
                    }
                };
                if let Err(err) = store.update(&id, update).await {
                    error!(job_id = %id, error = %err, "failed to persist terminal state");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineError;
    use async_trait::async_trait;
    use reel_models::{JobId, JobRecord, RenderParams};
    use reel_store::MemoryJobStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Processor that tracks concurrent executions and sleeps briefly.
    struct SlowProcessor {
        current: AtomicUsize,
        peak: AtomicUsize,
        fail_ids: Vec<&'static str>,
    }

    impl SlowProcessor {
        fn new(fail_ids: Vec<&'static str>) -> Self {
            Self {
                current: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                fail_ids,
            }
        }
    }

    #[async_trait]
    impl JobProcessor for SlowProcessor {
        async fn process(
            &self,
            record: &JobRecord,
            _reporter: &ProgressReporter,
        ) -> Result<String, PipelineError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);

            if self.fail_ids.contains(&record.id.as_str()) {
                Err(PipelineError::Internal("scripted failure".into()))
            } else {
                Ok(format!("video-{}.mp4", record.id))
            }
        }
    }

    fn test_config() -> WorkerConfig {
        WorkerConfig {
            max_concurrent_jobs: 2,
            poll_interval: Duration::from_millis(10),
            purge_interval: Duration::from_secs(3600),
            shutdown_timeout: Duration::from_secs(5),
            ..WorkerConfig::default()
        }
    }

    async fn run_until_terminal(
        store: Arc<MemoryJobStore>,
        processor: Arc<SlowProcessor>,
        ids: &[JobId],
    ) {
        let (tx, rx) = watch::channel(false);
        let loop_handle = tokio::spawn(
            WorkerLoop::new(store.clone(), processor, test_config(), rx).run(),
        );

        for _ in 0..200 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let mut all_done = true;
            for id in ids {
                if !store.get(id).await.unwrap().is_terminal() {
                    all_done = false;
                    break;
                }
            }
            if all_done {
                break;
            }
        }
        tx.send(true).unwrap();
        loop_handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_cap() {
        let store = Arc::new(MemoryJobStore::new());
        let mut ids = Vec::new();
        for i in 0..5 {
            let id = JobId::from_string(format!("job-{i}"));
            store
                .create(id.clone(), RenderParams::new("script"))
                .await
                .unwrap();
            ids.push(id);
        }

        let processor = Arc::new(SlowProcessor::new(vec![]));
        run_until_terminal(store.clone(), processor.clone(), &ids).await;

        assert!(processor.peak.load(Ordering::SeqCst) <= 2);
        for id in &ids {
            let record = store.get(id).await.unwrap();
            assert_eq!(record.status, JobStatus::Done);
            assert_eq!(record.result, Some(format!("video-{id}.mp4")));
            assert!(record.started_at.is_some());
        }
    }

    #[tokio::test]
    async fn test_failure_persists_error() {
        let store = Arc::new(MemoryJobStore::new());
        let id = JobId::from_string("doomed");
        store
            .create(id.clone(), RenderParams::new("script"))
            .await
            .unwrap();

        let processor = Arc::new(SlowProcessor::new(vec!["doomed"]));
        run_until_terminal(store.clone(), processor, std::slice::from_ref(&id)).await;

        let record = store.get(&id).await.unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("scripted failure"));
    }

    #[tokio::test]
    async fn test_shutdown_stops_claiming() {
        let store = Arc::new(MemoryJobStore::new());
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let id = JobId::from_string("never-claimed");
        store
            .create(id.clone(), RenderParams::new("script"))
            .await
            .unwrap();

        let processor = Arc::new(SlowProcessor::new(vec![]));
        WorkerLoop::new(store.clone(), processor, test_config(), rx)
            .run()
            .await;

        // The loop exited without touching the pending job.
        let record = store.get(&id).await.unwrap();
        assert_eq!(record.status, JobStatus::Pending);
    }
}
