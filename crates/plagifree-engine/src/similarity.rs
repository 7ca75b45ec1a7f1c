//! Vocabulary-overlap uniqueness score.
//!
//! This is a bag-of-words metric: reordering every word of a text without
//! changing its vocabulary scores close to zero.

use std::collections::HashSet;

fn vocabulary(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Percentage of the original's distinct words that do not appear in the
/// rewritten text, in `[0, 100]` and rounded to one decimal place.
///
/// An original without any words scores `0.0`.
pub fn uniqueness_score(original: &str, rewritten: &str) -> f64 {
    let original_words = vocabulary(original);
    if original_words.is_empty() {
        return 0.0;
    }
    let rewritten_words = vocabulary(rewritten);
    let shared = original_words.intersection(&rewritten_words).count();

    let similarity = shared as f64 / original_words.len() as f64 * 100.0;
    let uniqueness = (100.0 - similarity).clamp(0.0, 100.0);
    (uniqueness * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_original_scores_zero() {
        assert_eq!(uniqueness_score("", "anything at all"), 0.0);
        assert_eq!(uniqueness_score("   \n\t", "anything"), 0.0);
    }

    #[test]
    fn identical_vocabulary_scores_zero() {
        assert_eq!(uniqueness_score("The cat sat", "the CAT sat"), 0.0);
        // Order and repetition are ignored.
        assert_eq!(uniqueness_score("a b c", "c b a a a"), 0.0);
    }

    #[test]
    fn disjoint_vocabulary_scores_hundred() {
        assert_eq!(uniqueness_score("alpha beta", "gamma delta"), 100.0);
        assert_eq!(uniqueness_score("alpha beta", ""), 100.0);
    }

    #[test]
    fn partial_overlap_rounds_to_one_decimal() {
        // 1 of 3 words shared: 100 - 33.33.. = 66.66.. -> 66.7
        assert_eq!(uniqueness_score("one two three", "one four five"), 66.7);
        // 1 of 2 shared.
        assert_eq!(uniqueness_score("keep drop", "keep other words"), 50.0);
    }

    #[test]
    fn punctuation_stays_attached_to_tokens() {
        assert_eq!(uniqueness_score("end.", "end"), 100.0);
    }
}
