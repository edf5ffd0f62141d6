//! Trigram similarity with pg_trgm semantics
//!
//! Text is split into alphanumeric words, each lowercased word is padded
//! with two spaces in front and one behind, and the distinct 3-character
//! windows form the trigram set. Similarity is the Jaccard index of the two
//! sets.

use std::collections::BTreeSet;

/// Threshold used by the `%` operator in pg_trgm
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.3;

/// Distinct trigrams of `text`
pub fn trigrams(text: &str) -> BTreeSet<String> {
    let mut set = BTreeSet::new();

    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let padded: Vec<char> = "  "
            .chars()
            .chain(word.chars().flat_map(char::to_lowercase))
            .chain(std::iter::once(' '))
            .collect();

        for window in padded.windows(3) {
            set.insert(window.iter().collect());
        }
    }

    set
}

/// Shared trigrams divided by distinct trigrams of both inputs
///
/// Returns `0.0` when either side has no trigrams.
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    let left = trigrams(a);
    let right = trigrams(b);

    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let common = left.intersection(&right).count();
    let union = left.len() + right.len() - common;
    common as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_word_padding() {
        let set = trigrams("cat");
        let expected: BTreeSet<String> = ["  c", " ca", "cat", "at "]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(set, expected);
    }

    #[test]
    fn test_case_and_punctuation_ignored() {
        assert_eq!(trigrams("Cat!"), trigrams("cat"));
        assert_eq!(trigrams("a-b"), trigrams("a b"));
    }

    #[test]
    fn test_similarity_bounds() {
        assert_relative_eq!(trigram_similarity("mouse", "mouse"), 1.0);
        assert_relative_eq!(trigram_similarity("mouse", "zzz"), 0.0);
        assert_relative_eq!(trigram_similarity("", "mouse"), 0.0);
        assert_relative_eq!(trigram_similarity("!!", "??"), 0.0);
    }

    #[test]
    fn test_typo_stays_above_threshold() {
        // keybord drops one letter: 6 shared of 9 + 8 - 6 = 11 distinct
        let sim = trigram_similarity("keyboard", "keybord");
        assert_relative_eq!(sim, 6.0 / 11.0, epsilon = 1e-12);
        assert!(sim >= DEFAULT_SIMILARITY_THRESHOLD);
    }
}
