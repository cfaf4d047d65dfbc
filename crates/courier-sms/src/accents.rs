//! Accent stripping.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Folds accented letters onto their base letters.
///
/// The text is decomposed (NFD), combining marks are removed and the result
/// is recomposed, so `"Crème brûlée"` becomes `"Creme brulee"`. Letters with
/// no decomposition (such as `ø` or `ß`) are left untouched.
#[must_use]
pub fn strip_accents(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_accents_latin() {
        assert_eq!(strip_accents("Crème brûlée"), "Creme brulee");
        assert_eq!(strip_accents("àéîõü ÀÉÎÕÜ"), "aeiou AEIOU");
    }

    #[test]
    fn test_strip_accents_plain_ascii_unchanged() {
        assert_eq!(strip_accents("Hello, World!"), "Hello, World!");
    }

    #[test]
    fn test_strip_accents_keeps_undecomposable() {
        assert_eq!(strip_accents("ßø"), "ßø");
    }

    #[test]
    fn test_strip_accents_keeps_hangul_composed() {
        assert_eq!(strip_accents("한국어"), "한국어");
    }
}
