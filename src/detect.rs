//! Korean script detection.
//!
//! A caption is worth translating when any of its code points falls in the
//! Hangul blocks; everything else stays with the player's native rendering.

use std::sync::LazyLock;

use regex::Regex;

/// Hangul syllables (U+AC00..U+D7AF), jamo (U+1100..U+11FF) and
/// compatibility jamo (U+3130..U+318F).
static HANGUL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\u{AC00}-\u{D7AF}\u{1100}-\u{11FF}\u{3130}-\u{318F}]").unwrap()
});

/// Returns true if `text` contains at least one Hangul code point.
pub fn contains_hangul(text: &str) -> bool {
    HANGUL.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syllables_are_detected() {
        assert!(contains_hangul("안녕하세요"));
    }

    #[test]
    fn compatibility_jamo_is_detected() {
        assert!(contains_hangul("ㅋㅋㅋ"));
    }

    #[test]
    fn a_single_hangul_code_point_is_enough() {
        assert!(contains_hangul("OST: 사랑 (inst.)"));
    }

    #[test]
    fn latin_text_is_not_detected() {
        assert!(!contains_hangul("Hello there"));
    }

    #[test]
    fn other_cjk_scripts_are_not_detected() {
        assert!(!contains_hangul("你好"));
        assert!(!contains_hangul("こんにちは"));
    }

    #[test]
    fn empty_text_is_not_detected() {
        assert!(!contains_hangul(""));
    }
}
