//! Script segments produced by the planner and enriched by the pipeline.

use serde::{Deserialize, Serialize};

use crate::render::AssetKind;
use crate::transcript::TranscriptWord;

/// How a segment's visual should be sourced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// Visual is invented from a description, generative backends preferred
    Narrative,
    /// Visual names a real-world subject, search providers preferred
    Literal,
}

/// A local media file chosen for a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAsset {
    pub path: String,
    pub kind: AssetKind,
}

impl ResolvedAsset {
    pub fn image(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: AssetKind::Image,
        }
    }

    pub fn video(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: AssetKind::Video,
        }
    }
}

/// One planned chunk of the script.
///
/// The planner fills `text`, `kind` and the visual plan; alignment fills
/// the time span and word list; asset resolution fills `resolved`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Chunk text, 10-15 words, verbatim from the canonical script
    pub text: String,
    pub kind: SegmentKind,
    /// Search query or generative prompt for this chunk's visual
    pub visual_description: String,
    /// Prefer current real-world imagery over stock or generated media
    #[serde(default)]
    pub needs_real_world_search: bool,
    /// Start of the chunk in narration seconds, set by alignment
    #[serde(default)]
    pub start_time: f64,
    /// End of the chunk in narration seconds, set by alignment
    #[serde(default)]
    pub end_time: f64,
    /// Transcript words covered by this chunk
    #[serde(default)]
    pub words: Vec<TranscriptWord>,
    /// Candidate media URLs from search, best first
    #[serde(default)]
    pub alternate_candidates: Vec<String>,
    /// Chosen local media file, if resolution succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<ResolvedAsset>,
}

impl Segment {
    pub fn new(text: impl Into<String>, kind: SegmentKind, visual: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind,
            visual_description: visual.into(),
            needs_real_world_search: false,
            start_time: 0.0,
            end_time: 0.0,
            words: Vec::new(),
            alternate_candidates: Vec::new(),
            resolved: None,
        }
    }

    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }
}
