use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reel_models::{JobId, JobRecord, JobStatus, JobUpdate, RenderParams};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::{Result, StoreError};
use crate::JobStore;

/// File-backed store: one JSON document mapping job id to record.
///
/// Every write serializes the full map to `<path>.tmp` and renames it over
/// `<path>`, so a crash mid-write leaves the previous document intact and
/// readers never see a torn file. The in-process mutex serializes writers;
/// cross-process locking is not provided, a single worker owns the file.
pub struct FileJobStore {
    path: PathBuf,
    tmp_path: PathBuf,
    jobs: Mutex<HashMap<String, JobRecord>>,
}

impl FileJobStore {
    /// Open the store, loading any existing document.
    ///
    /// An unreadable document is logged and treated as empty rather than
    /// refusing to start; the next write replaces it.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let jobs = match fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(map) => map,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "job store document is corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err.into()),
        };

        let tmp_path = path.with_extension("tmp");
        Ok(Self {
            path,
            tmp_path,
            jobs: Mutex::new(jobs),
        })
    }

    async fn persist(&self, jobs: &HashMap<String, JobRecord>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(jobs)?;
        fs::write(&self.tmp_path, &bytes).await?;
        fs::rename(&self.tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl JobStore for FileJobStore {
    async fn create(&self, id: JobId, params: RenderParams) -> Result<JobRecord> {
        let mut jobs = self.jobs.lock().await;
        if let Some(existing) = jobs.get(id.as_str()) {
            if existing.status.is_active() {
                return Err(StoreError::conflict(id.as_str()));
            }
        }
        let record = JobRecord::new(id.clone(), params);
        jobs.insert(id.as_str().to_string(), record.clone());
        self.persist(&jobs).await?;
        Ok(record)
    }

    async fn get(&self, id: &JobId) -> Result<JobRecord> {
        self.jobs
            .lock()
            .await
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::not_found(id.as_str()))
    }

    async fn update(&self, id: &JobId, update: JobUpdate) -> Result<JobRecord> {
        let mut jobs = self.jobs.lock().await;
        let record = jobs
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::not_found(id.as_str()))?;
        record.apply(update);
        let updated = record.clone();
        self.persist(&jobs).await?;
        Ok(updated)
    }

    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<JobRecord>> {
        let jobs = self.jobs.lock().await;
        let mut records: Vec<JobRecord> = jobs
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }

    async fn purge_older_than(&self, max_age: Duration) -> Result<usize> {
        let cutoff = Utc::now() - max_age;
        let mut jobs = self.jobs.lock().await;
        let before = jobs.len();
        jobs.retain(|_, r| !(r.is_terminal() && r.created_at < cutoff));
        let removed = before - jobs.len();
        if removed > 0 {
            self.persist(&jobs).await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");

        {
            let store = FileJobStore::open(&path).await.unwrap();
            store
                .create(JobId::from_string("persisted"), RenderParams::new("s"))
                .await
                .unwrap();
        }

        let store = FileJobStore::open(&path).await.unwrap();
        let record = store.get(&JobId::from_string("persisted")).await.unwrap();
        assert_eq!(record.status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn test_no_tmp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        let store = FileJobStore::open(&path).await.unwrap();
        store
            .create(JobId::from_string("j"), RenderParams::new("s"))
            .await
            .unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_document_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = FileJobStore::open(&path).await.unwrap();
        let pending = store.list_by_status(JobStatus::Pending).await.unwrap();
        assert!(pending.is_empty());
    }
}
