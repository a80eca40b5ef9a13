//! Durable record of job lifecycle.
//!
//! One store instance is shared by the API front end (create, read) and a
//! single worker loop (claim, update, purge). Updates are whole-record
//! merges published atomically, so readers never observe a partial write.

mod error;
mod file;
mod memory;

pub use error::{Result, StoreError};
pub use file::FileJobStore;
pub use memory::MemoryJobStore;

use async_trait::async_trait;
use chrono::Duration;
use reel_models::{JobId, JobRecord, JobStatus, JobUpdate, RenderParams};

/// Job persistence contract.
///
/// `create` rejects ids that already denote a pending or running record;
/// a terminal record with the same id is replaced. `update` merges the
/// given fields into the stored record in one atomic step.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, id: JobId, params: RenderParams) -> Result<JobRecord>;

    async fn get(&self, id: &JobId) -> Result<JobRecord>;

    async fn update(&self, id: &JobId, update: JobUpdate) -> Result<JobRecord>;

    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<JobRecord>>;

    /// Remove terminal records older than `max_age`. Returns how many were
    /// removed. Active records are never purged.
    async fn purge_older_than(&self, max_age: Duration) -> Result<usize>;
}
