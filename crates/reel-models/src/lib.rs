//! Shared data models for the ReelForge render pipeline.
//!
//! Everything that crosses a crate boundary lives here: job records and
//! their lifecycle, render parameters, transcript words, script segments,
//! timeline assets, and the renderer request shape.

mod job;
mod render;
mod segment;
mod transcript;
mod voice;

pub use job::{JobId, JobRecord, JobStatus, JobUpdate, Preferences, RenderParams};
pub use render::{Asset, AssetKind, RenderOptions, RenderRequest, SubtitleStyle};
pub use segment::{ResolvedAsset, Segment, SegmentKind};
pub use transcript::{canonical_script, transcript_duration, TranscriptWord};
pub use voice::{Avatar, VoiceGender};
