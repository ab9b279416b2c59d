use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, ErrorKind, Result};

/// Configuration for a [`crate::index::PositionalIndex`] / [`crate::engine::SearchEngine`].
#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub data_path: PathBuf,
    /// Maintain the `(record, token)` reverse index for O(document-size) deletes.
    pub use_secondary_index: bool,
    pub writer_batch_size: usize,
    pub writer_max_segment_size: usize,
    pub block_cache_lifetime: Duration,
    pub block_cache_capacity: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            data_path: PathBuf::from("./data"),
            use_secondary_index: true,
            writer_batch_size: 1000,
            writer_max_segment_size: 50 * 1024 * 1024,
            block_cache_lifetime: Duration::from_secs(300),
            block_cache_capacity: 4096,
        }
    }
}

impl IndexConfig {
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    pub fn with_secondary_index(mut self, enabled: bool) -> Self {
        self.use_secondary_index = enabled;
        self
    }
}

/// Configuration for the default word tokenizer.
#[derive(Debug, Clone)]
pub struct TokenizerConfig {
    /// Minimum token length (in Unicode graphemes). Negative values are rejected at
    /// construction time; the validated value is always non-negative here.
    pub min_length: usize,
    pub include_digits: bool,
    pub lowercase: bool,
    pub stop_words: Vec<String>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        TokenizerConfig {
            min_length: 3,
            include_digits: true,
            lowercase: true,
            stop_words: Vec::new(),
        }
    }
}

impl TokenizerConfig {
    /// Validates a caller-supplied minimum length before it is folded into a
    /// [`TokenizerConfig`]. Negative lengths are an `InvalidConfiguration` error
    /// rather than a silent clamp.
    pub fn with_min_length(mut self, min_length: i64) -> Result<Self> {
        if min_length < 0 {
            return Err(Error::new(
                ErrorKind::InvalidConfiguration,
                format!("tokenizer minimum length must not be negative, got {min_length}"),
            ));
        }
        self.min_length = min_length as usize;
        Ok(self)
    }

    pub fn with_stop_words(mut self, stop_words: Vec<String>) -> Self {
        self.stop_words = stop_words;
        self
    }
}
