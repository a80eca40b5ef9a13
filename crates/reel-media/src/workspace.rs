//! Per-job temporary workspace.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::error::MediaResult;

/// Directory holding one job's intermediate media.
///
/// Audio, downloaded candidates and generated clips all land here. The
/// directory is private to its job and removed exactly once at the job's
/// terminal transition, success or failure.
pub struct JobWorkspace {
    root: PathBuf,
}

impl JobWorkspace {
    /// Create the workspace directory for a job.
    pub async fn create(base: impl AsRef<Path>, job_id: &str) -> MediaResult<Self> {
        let root = base.as_ref().join(format!("job-{job_id}"));
        fs::create_dir_all(&root).await?;
        debug!(path = %root.display(), "created job workspace");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for a named file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Delete the workspace and everything in it. Failures are logged,
    /// never propagated; leftover temp files must not fail a finished job.
    pub async fn cleanup(self) {
        if let Err(err) = fs::remove_dir_all(&self.root).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.root.display(), error = %err, "failed to remove job workspace");
            }
        }
    }
}
