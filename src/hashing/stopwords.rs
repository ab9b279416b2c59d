/// A small default English stop-word list, handed to
/// [`crate::config::TokenizerConfig::with_stop_words`] by callers who want
/// one without assembling their own.
pub fn english() -> Vec<String> {
    [
        "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has",
        "he", "in", "is", "it", "its", "of", "on", "that", "the", "to", "was",
        "will", "with",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
