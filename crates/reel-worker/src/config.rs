//! Worker configuration.

use std::time::Duration;

/// Worker configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum jobs rendered concurrently
    pub max_concurrent_jobs: usize,
    /// How often the loop scans for pending jobs
    pub poll_interval: Duration,
    /// How often terminal records are purged
    pub purge_interval: Duration,
    /// Terminal records older than this are purged
    pub purge_max_age: Duration,
    /// Graceful shutdown drain budget
    pub shutdown_timeout: Duration,
    /// Base directory for per-job workspaces
    pub work_dir: String,
    /// Path of the job store document
    pub store_path: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            poll_interval: Duration::from_secs(5),
            purge_interval: Duration::from_secs(3600),
            purge_max_age: Duration::from_secs(24 * 3600),
            shutdown_timeout: Duration::from_secs(30),
            work_dir: "/tmp/reelforge".to_string(),
            store_path: "data/jobs.json".to_string(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_concurrent_jobs: std::env::var("WORKER_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            poll_interval: Duration::from_millis(
                std::env::var("WORKER_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5000),
            ),
            purge_interval: Duration::from_secs(
                std::env::var("WORKER_PURGE_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3600),
            ),
            purge_max_age: Duration::from_secs(
                std::env::var("WORKER_PURGE_MAX_AGE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(24 * 3600),
            ),
            shutdown_timeout: Duration::from_secs(
                std::env::var("WORKER_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .unwrap_or_else(|_| "/tmp/reelforge".to_string()),
            store_path: std::env::var("JOB_STORE_PATH")
                .unwrap_or_else(|_| "data/jobs.json".to_string()),
        }
    }
}
