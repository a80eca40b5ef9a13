//! Weighted progress reporting.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use reel_models::{JobId, JobUpdate};
use reel_store::JobStore;
use tracing::warn;

/// Fixed milestones, proportional to step weight.
pub mod milestone {
    /// Narration synthesized
    pub const SYNTHESIS: u8 = 10;
    /// Transcript obtained
    pub const TRANSCRIPTION: u8 = 20;
    /// Script segmented and visuals planned
    pub const SEGMENTATION: u8 = 30;
    /// First segment's visual resolution begins
    pub const RESOLUTION_START: u8 = 40;
    /// All segment visuals handled
    pub const RESOLUTION_END: u8 = 85;
    /// Render submitted
    pub const RENDER: u8 = 90;
}

/// Writes progress and status messages for one job.
///
/// Progress only moves forward; a stale update from a slow step can never
/// roll the displayed percentage back. Store failures are logged and
/// swallowed, progress is cosmetic and must never fail a job.
pub struct ProgressReporter {
    store: Arc<dyn JobStore>,
    id: JobId,
    last: AtomicU8,
}

impl ProgressReporter {
    pub fn new(store: Arc<dyn JobStore>, id: JobId) -> Self {
        Self {
            store,
            id,
            last: AtomicU8::new(0),
        }
    }

    pub async fn report(&self, progress: u8, message: impl Into<String>) {
        let progress = progress.min(100).max(self.last.load(Ordering::SeqCst));
        self.last.store(progress, Ordering::SeqCst);
        if let Err(err) = self
            .store
            .update(&self.id, JobUpdate::progress(progress, message))
            .await
        {
            warn!(job_id = %self.id, error = %err, "progress update failed");
        }
    }

    /// Progress for segment `index` of `total`, spread evenly across the
    /// resolution band.
    pub fn segment_progress(index: usize, total: usize) -> u8 {
        if total == 0 {
            return milestone::RESOLUTION_START;
        }
        let band = (milestone::RESOLUTION_END - milestone::RESOLUTION_START) as usize;
        milestone::RESOLUTION_START + (band * index / total) as u8
    }
}
