//! Maps text segments back onto a word-level transcript.
//!
//! Segmentation runs on rebuilt transcript text, but the planner may still
//! regroup or respace words, so matching is done on normalized tokens with
//! tolerant window comparison rather than exact word-by-word equality.

use reel_models::{Segment, TranscriptWord};
use tracing::debug;

mod normalize;

pub use normalize::normalize_token;

/// Window used when a phrase cannot be located in the transcript.
const FALLBACK_WORDS: usize = 5;

/// The transcript span a phrase was matched to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhraseSpan {
    pub start_time: f64,
    pub end_time: f64,
    /// Index of the first covered transcript word
    pub start_index: usize,
    /// Index of the last covered transcript word (inclusive)
    pub end_index: usize,
}

/// One normalized token with its owning transcript word.
///
/// Transcript entries sometimes hold several space-separated tokens; each
/// token becomes an atom so phrase words can match across that grouping.
struct Atom {
    norm: String,
    word_index: usize,
}

fn flatten(transcript: &[TranscriptWord]) -> Vec<Atom> {
    let mut atoms = Vec::with_capacity(transcript.len());
    for (word_index, word) in transcript.iter().enumerate() {
        for token in word.text.split_whitespace() {
            let norm = normalize_token(token);
            if !norm.is_empty() {
                atoms.push(Atom { norm, word_index });
            }
        }
    }
    atoms
}

/// Locate `phrase` in `transcript`, searching forward from transcript word
/// index `search_from`.
///
/// The search is forward-only. Callers aligning a sequence of phrases
/// should pass the previous match's `end_index + 1` as the next cursor so
/// spans never move backward. Always returns a span; when no match exists
/// the next few unconsumed words after the cursor are used instead.
pub fn align(transcript: &[TranscriptWord], phrase: &str, search_from: usize) -> PhraseSpan {
    if transcript.is_empty() {
        return PhraseSpan {
            start_time: 0.0,
            end_time: 0.0,
            start_index: 0,
            end_index: 0,
        };
    }

    let phrase_words: Vec<String> = phrase
        .split_whitespace()
        .map(normalize_token)
        .filter(|w| !w.is_empty())
        .collect();

    if !phrase_words.is_empty() {
        let atoms = flatten(transcript);
        let first_atom = atoms
            .iter()
            .position(|a| a.word_index >= search_from)
            .unwrap_or(atoms.len());

        for anchor in first_atom..atoms.len() {
            if atoms[anchor].norm != phrase_words[0] {
                continue;
            }
            // Try the longest prefix of the phrase first, shrinking until
            // something matches. Comparison is over concatenated normalized
            // text, which absorbs grouping differences on both sides.
            for window in (1..=phrase_words.len()).rev() {
                let target: String = phrase_words[..window].concat();
                if let Some(last) = match_concat(&atoms, anchor, &target) {
                    let start_index = atoms[anchor].word_index;
                    let end_index = atoms[last].word_index;
                    return PhraseSpan {
                        start_time: transcript[start_index].start_time,
                        end_time: transcript[end_index].end_time,
                        start_index,
                        end_index,
                    };
                }
            }
        }
    }

    debug!(phrase, search_from, "phrase not found in transcript, using fallback window");
    let start_index = search_from.min(transcript.len() - 1);
    let end_index = (start_index + FALLBACK_WORDS - 1).min(transcript.len() - 1);
    PhraseSpan {
        start_time: transcript[start_index].start_time,
        end_time: transcript[end_index].end_time,
        start_index,
        end_index,
    }
}

/// Match `target` against the concatenation of atom text starting at
/// `anchor`. Returns the index of the last atom consumed on an exact match.
fn match_concat(atoms: &[Atom], anchor: usize, target: &str) -> Option<usize> {
    let mut built = String::new();
    for (i, atom) in atoms.iter().enumerate().skip(anchor) {
        built.push_str(&atom.norm);
        if built.len() >= target.len() {
            return (built == target).then_some(i);
        }
        if !target.starts_with(built.as_str()) {
            return None;
        }
    }
    None
}

/// Align every segment in order, threading the cursor so spans are
/// non-decreasing, and attach the covered transcript words.
pub fn align_segments(transcript: &[TranscriptWord], segments: &mut [Segment]) {
    let mut cursor = 0usize;
    for segment in segments.iter_mut() {
        let span = align(transcript, &segment.text, cursor);
        segment.start_time = span.start_time;
        segment.end_time = span.end_time;
        segment.words = transcript
            .get(span.start_index..=span.end_index)
            .map(|w| w.to_vec())
            .unwrap_or_default();
        cursor = span.end_index + 1;
    }
}

/// Repair segment boundaries so the timeline is gapless.
///
/// The first segment starts at zero, each segment ends where the next one
/// starts, and the last segment ends at the measured audio duration.
/// Running it twice changes nothing.
pub fn adjust_for_continuity(segments: &mut [Segment], total_duration: f64) {
    if segments.is_empty() {
        return;
    }
    segments[0].start_time = 0.0;
    for i in 0..segments.len() - 1 {
        segments[i].end_time = segments[i + 1].start_time;
    }
    if let Some(last) = segments.last_mut() {
        last.end_time = total_duration;
    }
}
