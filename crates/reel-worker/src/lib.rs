//! Render worker: the per-job pipeline and the loop that schedules it.

mod config;
mod pipeline;
mod progress;
mod retry;
mod worker;

pub use config::WorkerConfig;
pub use pipeline::{JobProcessor, PipelineError, RenderPipeline};
pub use progress::{milestone, ProgressReporter};
pub use retry::{retry_async, RetryConfig};
pub use worker::WorkerLoop;
