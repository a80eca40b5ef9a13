use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reel_models::{JobId, JobRecord, JobStatus, JobUpdate, RenderParams};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::JobStore;

/// In-memory store for tests and single-shot tooling.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<String, JobRecord>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, id: JobId, params: RenderParams) -> Result<JobRecord> {
        let mut jobs = self.jobs.write().await;
        if let Some(existing) = jobs.get(id.as_str()) {
            if existing.status.is_active() {
                return Err(StoreError::conflict(id.as_str()));
            }
        }
        let record = JobRecord::new(id.clone(), params);
        jobs.insert(id.as_str().to_string(), record.clone());
        Ok(record)
    }

    async fn get(&self, id: &JobId) -> Result<JobRecord> {
        self.jobs
            .read()
            .await
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::not_found(id.as_str()))
    }

    async fn update(&self, id: &JobId, update: JobUpdate) -> Result<JobRecord> {
        let mut jobs = self.jobs.write().await;
        let record = jobs
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::not_found(id.as_str()))?;
        record.apply(update);
        Ok(record.clone())
    }

    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<JobRecord>> {
        let jobs = self.jobs.read().await;
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
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, r| !(r.is_terminal() && r.created_at < cutoff));
        Ok(before - jobs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_purge_keeps_active_jobs() {
        let store = MemoryJobStore::new();
        let id = JobId::from_string("old-but-running");
        store
            .create(id.clone(), RenderParams::new("s"))
            .await
            .unwrap();
        store.update(&id, JobUpdate::claimed()).await.unwrap();

        // Zero max age would purge everything terminal, but the running
        // job must survive.
        let removed = store.purge_older_than(Duration::zero()).await.unwrap();
        assert_eq!(removed, 0);
        assert!(store.get(&id).await.is_ok());

        store.update(&id, JobUpdate::failed("boom")).await.unwrap();
        let removed = store.purge_older_than(Duration::zero()).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.get(&id).await.is_err());
    }

    #[tokio::test]
    async fn test_list_by_status_is_fifo() {
        let store = MemoryJobStore::new();
        for name in ["first", "second", "third"] {
            store
                .create(JobId::from_string(name), RenderParams::new("s"))
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        let pending = store.list_by_status(JobStatus::Pending).await.unwrap();
        let ids: Vec<&str> = pending.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["first", "second", "third"]);
    }
}
