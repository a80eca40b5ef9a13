/// Normalize one token for matching: lowercase, alphanumerics only.
///
/// Unicode-aware so Devanagari and other non-Latin scripts survive; only
/// punctuation and symbols are stripped.
pub fn normalize_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_punctuation_and_lowercases() {
        assert_eq!(normalize_token("Hello,"), "hello");
        assert_eq!(normalize_token("world!?"), "world");
        assert_eq!(normalize_token("don't"), "dont");
    }

    #[test]
    fn test_keeps_digits() {
        assert_eq!(normalize_token("2024."), "2024");
    }

    #[test]
    fn test_keeps_devanagari() {
        assert_eq!(normalize_token("दुनिया।"), "दुनिया");
    }

    #[test]
    fn test_pure_punctuation_becomes_empty() {
        assert_eq!(normalize_token("—"), "");
    }
}
