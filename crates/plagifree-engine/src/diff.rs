use serde::Serialize;

/// A sentence at the same position in both texts whose wording differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentenceChange {
    pub original: String,
    pub rewritten: String,
}

fn sentences(text: &str) -> Vec<&str> {
    text.split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Compare two texts sentence by sentence, by position only.
///
/// Sentences are the trimmed, non-empty fragments between periods. Sentence
/// `i` of the original is only ever compared with sentence `i` of the
/// rewrite; positions past the end of the shorter text are not reported.
pub fn changed_sentences(original: &str, rewritten: &str) -> Vec<SentenceChange> {
    sentences(original)
        .into_iter()
        .zip(sentences(rewritten))
        .filter(|(o, r)| o.to_lowercase() != r.to_lowercase())
        .map(|(o, r)| SentenceChange {
            original: o.to_string(),
            rewritten: r.to_string(),
        })
        .collect()
}
