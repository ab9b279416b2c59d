use std::collections::HashSet;
use std::iter::Peekable;
use std::str::CharIndices;

use unicode_segmentation::UnicodeSegmentation;

use crate::config::TokenizerConfig;
use crate::hashing::slice::Slice;

/// Produces a finite, non-restartable lazy sequence of [`Slice`]s over a
/// text buffer. Each call to [`Tokenizer::tokenize`] starts a fresh pass;
/// the returned iterator cannot be rewound.
pub trait Tokenizer: Send + Sync {
    fn tokenize<'a>(&self, text: &'a str) -> Box<dyn Iterator<Item = Slice> + 'a>;

    fn clone_box(&self) -> Box<dyn Tokenizer>;
}

/// Splits text into contiguous runs of "word" characters (letters,
/// optionally digits) separated by anything else, applying the configured
/// minimum length and stop-word filters.
#[derive(Clone)]
pub struct WordTokenizer {
    min_length: usize,
    include_digits: bool,
    lowercase: bool,
    stop_words: HashSet<String>,
}

impl WordTokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        WordTokenizer {
            min_length: config.min_length,
            include_digits: config.include_digits,
            lowercase: config.lowercase,
            stop_words: config.stop_words.into_iter().map(|w| w.to_lowercase()).collect(),
        }
    }
}

impl Tokenizer for WordTokenizer {
    fn tokenize<'a>(&self, text: &'a str) -> Box<dyn Iterator<Item = Slice> + 'a> {
        Box::new(WordTokens {
            text,
            chars: text.char_indices().peekable(),
            min_length: self.min_length,
            include_digits: self.include_digits,
            lowercase: self.lowercase,
            stop_words: self.stop_words.clone(),
        })
    }

    fn clone_box(&self) -> Box<dyn Tokenizer> {
        Box::new(self.clone())
    }
}

struct WordTokens<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
    min_length: usize,
    include_digits: bool,
    lowercase: bool,
    stop_words: HashSet<String>,
}

impl<'a> WordTokens<'a> {
    fn is_word_char(&self, c: char) -> bool {
        c.is_alphabetic() || (self.include_digits && c.is_numeric())
    }
}

impl<'a> Iterator for WordTokens<'a> {
    type Item = Slice;

    fn next(&mut self) -> Option<Slice> {
        loop {
            while let Some(&(_, c)) = self.chars.peek() {
                if self.is_word_char(c) {
                    break;
                }
                self.chars.next();
            }

            let (start, first) = self.chars.next()?;
            let mut end = start + first.len_utf8();
            while let Some(&(idx, c)) = self.chars.peek() {
                if self.is_word_char(c) {
                    end = idx + c.len_utf8();
                    self.chars.next();
                } else {
                    break;
                }
            }

            let raw = &self.text[start..end];
            if raw.graphemes(true).count() < self.min_length {
                continue;
            }
            if self.lowercase && self.stop_words.contains(&raw.to_lowercase()) {
                continue;
            }
            if !self.lowercase && self.stop_words.contains(raw) {
                continue;
            }

            return Some(Slice::new(start, end - start));
        }
    }
}
