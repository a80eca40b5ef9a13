//! Narration voice catalog.

use serde::{Deserialize, Serialize};

/// Voice gender, passed through to the speech synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoiceGender {
    Male,
    Female,
}

impl VoiceGender {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceGender::Male => "MALE",
            VoiceGender::Female => "FEMALE",
        }
    }
}

/// Narration avatar selected by the caller.
///
/// Each avatar maps to one synthesizer voice. The language code also drives
/// transcription, so avatar choice decides the whole speech pipeline's
/// locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Avatar {
    /// US English studio female
    #[default]
    Female,
    /// US English studio male
    Male,
    /// Indian English male
    MaleIn,
    /// Indian English female, voice 1
    F1EnIn,
    /// Indian English female, voice 2
    F2EnIn,
    /// Hindi female, voice 1
    F3HiIn,
    /// Hindi female, voice 2
    F4HiIn,
}

impl Avatar {
    /// BCP-47 language code for synthesis and transcription.
    pub fn language_code(&self) -> &'static str {
        match self {
            Avatar::Female | Avatar::Male => "en-US",
            Avatar::MaleIn | Avatar::F1EnIn | Avatar::F2EnIn => "en-IN",
            Avatar::F3HiIn | Avatar::F4HiIn => "hi-IN",
        }
    }

    pub fn gender(&self) -> VoiceGender {
        match self {
            Avatar::Male | Avatar::MaleIn => VoiceGender::Male,
            _ => VoiceGender::Female,
        }
    }

    /// Synthesizer voice name.
    pub fn voice_id(&self) -> &'static str {
        match self {
            Avatar::Female => "en-US-Studio-O",
            Avatar::Male => "en-US-Studio-Q",
            Avatar::MaleIn => "en-IN-Chirp3-HD-Algenib",
            Avatar::F1EnIn => "en-IN-Chirp3-HD-Achernar",
            Avatar::F2EnIn => "en-IN-Chirp3-HD-Despina",
            Avatar::F3HiIn => "hi-IN-Chirp3-HD-Achernar",
            Avatar::F4HiIn => "hi-IN-Chirp3-HD-Despina",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_table_consistency() {
        for avatar in [
            Avatar::Female,
            Avatar::Male,
            Avatar::MaleIn,
            Avatar::F1EnIn,
            Avatar::F2EnIn,
            Avatar::F3HiIn,
            Avatar::F4HiIn,
        ] {
            // Voice names are prefixed with their language code.
            assert!(avatar.voice_id().starts_with(avatar.language_code()));
        }
    }

    #[test]
    fn test_hindi_avatars() {
        assert_eq!(Avatar::F3HiIn.language_code(), "hi-IN");
        assert_eq!(Avatar::F4HiIn.gender(), VoiceGender::Female);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Avatar::F1EnIn).unwrap();
        assert_eq!(json, "\"f1_en_in\"");
        let back: Avatar = serde_json::from_str("\"male_in\"").unwrap();
        assert_eq!(back, Avatar::MaleIn);
    }
}
