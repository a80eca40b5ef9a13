//! Renderer request types.

use serde::{Deserialize, Serialize};

use crate::transcript::TranscriptWord;

/// Media kind on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Image,
    Video,
}

/// One timeline entry: a media file shown over a time span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub path: String,
    pub kind: AssetKind,
    /// Start in narration seconds
    pub start: f64,
    /// End in narration seconds
    pub end: f64,
}

/// Subtitle styling for the compositor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleStyle {
    pub font_size: u32,
    /// Color of the word currently being spoken
    pub highlight_color: String,
    pub normal_color: String,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_size: 60,
            highlight_color: "#FF0".to_string(),
            normal_color: "#FFF".to_string(),
        }
    }
}

/// Composition options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Burn word-highlighted subtitles
    pub subtitles: bool,
    /// Words shown per subtitle line
    pub words_per_line: u32,
    pub subtitle_style: SubtitleStyle,
    /// Overlay logo, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Narration audio file
    pub audio_url: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            subtitles: true,
            words_per_line: 3,
            subtitle_style: SubtitleStyle::default(),
            logo_url: None,
            audio_url: String::new(),
        }
    }
}

/// Full request handed to the video renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Output name, derived from the job id
    pub output_name: String,
    /// Word timings for subtitle highlighting
    pub words: Vec<TranscriptWord>,
    /// Visual timeline, sorted by start
    pub assets: Vec<Asset>,
    pub options: RenderOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtitle_defaults() {
        let style = SubtitleStyle::default();
        assert_eq!(style.font_size, 60);
        assert_eq!(style.highlight_color, "#FF0");
    }

    #[test]
    fn test_render_request_roundtrip() {
        let req = RenderRequest {
            output_name: "video-abc".to_string(),
            words: vec![TranscriptWord::new("hi", 0.0, 0.3)],
            assets: vec![Asset {
                path: "/tmp/job/seg0.mp4".to_string(),
                kind: AssetKind::Video,
                start: 0.0,
                end: 3.2,
            }],
            options: RenderOptions::default(),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"kind\":\"video\""));
        let back: RenderRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.assets, req.assets);
    }
}
