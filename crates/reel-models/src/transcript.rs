//! Word-level transcript types.

use serde::{Deserialize, Serialize};

/// One recognized word with its audio offsets in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptWord {
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
}

impl TranscriptWord {
    pub fn new(text: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            text: text.into(),
            start_time,
            end_time,
        }
    }
}

/// Rebuild the narration text from transcript words.
///
/// Words are joined with single spaces, except that tokens starting with
/// closing punctuation attach to the previous word. Segmentation runs on
/// this rebuilt text rather than the submitted script, so segment words
/// match transcript words exactly.
pub fn canonical_script(words: &[TranscriptWord]) -> String {
    let mut out = String::new();
    for word in words {
        if word.text.is_empty() {
            continue;
        }
        let attaches = word
            .text
            .chars()
            .next()
            .map(|c| matches!(c, '.' | ',' | '!' | '?' | '।'))
            .unwrap_or(false);
        if !out.is_empty() && !attaches {
            out.push(' ');
        }
        out.push_str(&word.text);
    }
    out
}

/// Total narration duration, the end offset of the last word.
pub fn transcript_duration(words: &[TranscriptWord]) -> f64 {
    words.last().map(|w| w.end_time).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, start: f64, end: f64) -> TranscriptWord {
        TranscriptWord::new(text, start, end)
    }

    #[test]
    fn test_canonical_script_joins_with_spaces() {
        let words = vec![word("The", 0.0, 0.2), word("quick", 0.2, 0.5), word("fox", 0.5, 0.9)];
        assert_eq!(canonical_script(&words), "The quick fox");
    }

    #[test]
    fn test_canonical_script_attaches_punctuation() {
        let words = vec![
            word("Hello", 0.0, 0.4),
            word(",", 0.4, 0.4),
            word("world", 0.5, 0.9),
            word("!", 0.9, 0.9),
        ];
        assert_eq!(canonical_script(&words), "Hello, world!");
    }

    #[test]
    fn test_canonical_script_hindi_danda() {
        let words = vec![word("नमस्ते", 0.0, 0.6), word("।", 0.6, 0.6)];
        assert_eq!(canonical_script(&words), "नमस्ते।");
    }

    #[test]
    fn test_duration_of_empty_transcript() {
        assert_eq!(transcript_duration(&[]), 0.0);
        let words = vec![word("a", 0.0, 1.0), word("b", 1.0, 2.5)];
        assert_eq!(transcript_duration(&words), 2.5);
    }
}
