//! Local media plumbing for the render pipeline.

mod download;
mod error;
mod probe;
mod repair;
mod workspace;

pub use download::download_to_dir;
pub use error::{MediaError, MediaResult};
pub use probe::media_duration;
pub use repair::fix_if_broken;
pub use workspace::JobWorkspace;
