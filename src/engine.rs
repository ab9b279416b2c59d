use std::collections::HashSet;
use std::hash::Hash;

use crate::config::{IndexConfig, TokenizerConfig};
use crate::error::Result;
use crate::hashing::{DefaultHashGenerator, HashGenerator, Tokenizer, WordTokenizer};
use crate::index::PositionalIndex;
use crate::keys::{FixedKey, START_OF_RECORD};
use crate::query::ast::SearchQuery;
use crate::query::{lower_query, parse_query};
use crate::search::CancellationToken;

/// Glues a tokenizer, a hash generator, and a [`PositionalIndex`] into the
/// text-level operations callers actually want: add/update/delete records,
/// attach/detach facets, and run searches against raw query text.
pub struct SearchEngine<R: FixedKey> {
    index: PositionalIndex<R>,
    tokenizer: Box<dyn Tokenizer>,
    hasher: Box<dyn HashGenerator>,
}

/// Computes the ordered `(token, previous_token)` chain a document's text
/// produces, starting from the start-of-record sentinel.
fn token_chain(tokenizer: &dyn Tokenizer, hasher: &dyn HashGenerator, text: &str) -> Vec<(u64, u64)> {
    let mut chain = Vec::new();
    let mut prev = START_OF_RECORD;
    for slice in tokenizer.tokenize(text) {
        let token = hasher.hash(slice.resolve(text));
        chain.push((token, prev));
        prev = token;
    }
    chain
}

impl<R: FixedKey + Eq + Hash> SearchEngine<R> {
    pub fn open(config: IndexConfig, tokenizer_config: TokenizerConfig) -> Result<Self> {
        let index = PositionalIndex::open(&config)?;
        Ok(SearchEngine { index, tokenizer: Box::new(WordTokenizer::from(tokenizer_config)), hasher: Box::new(DefaultHashGenerator) })
    }

    fn facet_token(&self, name: &str, value: &str) -> u64 {
        self.hasher.hash(&format!("{name}:{value}"))
    }

    pub fn add_record(&self, record: R, text: &str) -> Result<()> {
        for (token, prev) in token_chain(self.tokenizer.as_ref(), self.hasher.as_ref(), text) {
            self.index.upsert(token, record, prev)?;
        }
        Ok(())
    }

    /// Applies only the symmetric difference between `old_text`'s and
    /// `new_text`'s triples, rather than a full delete-then-add.
    pub fn update_record(&self, record: R, old_text: &str, new_text: &str) -> Result<()> {
        let old_chain: HashSet<(u64, u64)> = token_chain(self.tokenizer.as_ref(), self.hasher.as_ref(), old_text).into_iter().collect();
        let new_chain: HashSet<(u64, u64)> = token_chain(self.tokenizer.as_ref(), self.hasher.as_ref(), new_text).into_iter().collect();

        for &(token, prev) in old_chain.difference(&new_chain) {
            self.index.delete(token, record, prev)?;
        }
        for &(token, prev) in new_chain.difference(&old_chain) {
            self.index.upsert(token, record, prev)?;
        }
        Ok(())
    }

    /// Removes exactly the triples `text` derives for `record`, returning
    /// how many distinct triples were targeted.
    pub fn delete_tokens(&self, record: R, text: &str) -> Result<usize> {
        let chain: HashSet<(u64, u64)> = token_chain(self.tokenizer.as_ref(), self.hasher.as_ref(), text).into_iter().collect();
        for &(token, prev) in &chain {
            self.index.delete(token, record, prev)?;
        }
        Ok(chain.len())
    }

    pub fn delete_record(&self, record: R) -> Result<usize> {
        self.index.delete_record(record)
    }

    pub fn add_facet(&self, record: R, name: &str, value: &str) -> Result<()> {
        let token = self.facet_token(name, value);
        self.index.upsert(token, record, token)
    }

    pub fn delete_facet(&self, record: R, name: &str, value: &str) -> Result<()> {
        let token = self.facet_token(name, value);
        self.index.delete(token, record, token)
    }

    /// Tokenizes `search_text` into an unordered AND group and `facets`
    /// into an OR group, then runs the simple probe-and-verify executor.
    pub fn simple_search(
        &self,
        search_text: &str,
        facets: &[(&str, &str)],
        respect_order: bool,
        skip: usize,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<R>> {
        let tokens: Vec<u64> =
            self.tokenizer.tokenize(search_text).map(|slice| self.hasher.hash(slice.resolve(search_text))).collect();
        let facet_tokens: Vec<u64> = facets.iter().map(|(name, value)| self.facet_token(name, value)).collect();
        self.index.simple_search(&tokens, None, respect_order, &facet_tokens, skip, limit, cancel)
    }

    /// Parses and lowers `query_text` through the full grammar, then runs
    /// the advanced executor.
    pub fn search(&self, query_text: &str, skip: usize, limit: usize, cancel: &CancellationToken) -> Result<Vec<R>> {
        let ast = parse_query(query_text)?;
        let lowered = lower_query(&ast, self.tokenizer.as_ref(), self.hasher.as_ref());
        self.index.search(&lowered, skip, limit, cancel)
    }

    /// Runs a pre-built (already string-leafed) query, e.g. assembled
    /// programmatically rather than parsed from text.
    pub fn search_query(&self, query: &SearchQuery<String>, cancel: &CancellationToken) -> Result<Vec<R>> {
        let lowered = lower_query(&query.root, self.tokenizer.as_ref(), self.hasher.as_ref());
        self.index.search(&lowered, query.skip, query.limit, cancel)
    }

    pub fn evict_to_disk(&self) -> Result<()> {
        self.index.evict_to_disk()
    }

    pub fn close(&self) {
        self.index.close();
    }

    pub fn is_dropped(&self) -> bool {
        self.index.is_dropped()
    }

    pub fn is_read_only(&self) -> bool {
        self.index.is_read_only()
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.index.set_read_only(read_only);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn engine(dir: &std::path::Path) -> SearchEngine<u64> {
        let config = IndexConfig::default().with_data_path(dir.to_path_buf());
        SearchEngine::open(config, TokenizerConfig::default().with_min_length(1).unwrap()).unwrap()
    }

    #[test]
    fn end_to_end_scenario_from_literal_table() {
        let dir = tempdir().unwrap();
        let engine = engine(dir.path());
        engine.add_record(1, "fox").unwrap();
        engine.add_record(2, "fox cow cat").unwrap();
        engine.add_record(3, "fox cat cow").unwrap();
        engine.add_facet(3, "category", "red").unwrap();

        let cancel = CancellationToken::new();
        let mut result = engine.search("(cat OR cow) AND NOT category:tear", 0, 0, &cancel).unwrap();
        result.sort();
        assert_eq!(result, vec![2, 3]);

        let mut result = engine.search("cat cow AND NOT category:red", 0, 0, &cancel).unwrap();
        result.sort();
        assert_eq!(result, vec![2]);

        let result = engine.search("'cat cow' AND NOT category:red", 0, 0, &cancel).unwrap();
        assert!(result.is_empty());

        let result = engine.search("'cat cow' AND NOT category:blue", 0, 0, &cancel).unwrap();
        assert_eq!(result, vec![3]);
    }

    #[test]
    fn facet_roundtrip_returns_to_pre_add_state() {
        let dir = tempdir().unwrap();
        let engine = engine(dir.path());
        engine.add_record(1, "fox").unwrap();
        let cancel = CancellationToken::new();
        let before = engine.simple_search("fox", &[], false, 0, 0, &cancel).unwrap();

        engine.add_facet(1, "category", "red").unwrap();
        engine.delete_facet(1, "category", "red").unwrap();
        let after = engine.simple_search("fox", &[], false, 0, 0, &cancel).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn update_record_matches_delete_then_add() {
        let dir = tempdir().unwrap();
        let engine = engine(dir.path());
        engine.add_record(1, "fox cow").unwrap();
        engine.update_record(1, "fox cow", "fox cat").unwrap();

        let cancel = CancellationToken::new();
        assert_eq!(engine.simple_search("cow", &[], false, 0, 0, &cancel).unwrap(), Vec::<u64>::new());
        assert_eq!(engine.simple_search("cat", &[], false, 0, 0, &cancel).unwrap(), vec![1]);
    }

    #[test]
    fn unicode_min_length_one_tokenizes_cjk_runs() {
        let dir = tempdir().unwrap();
        let engine = engine(dir.path());
        engine.add_record(1, "こんにちは 世界").unwrap();
        engine.add_record(3, "你好 世界").unwrap();

        let cancel = CancellationToken::new();
        let mut result = engine.simple_search("世界", &[], false, 0, 0, &cancel).unwrap();
        result.sort();
        assert_eq!(result, vec![1, 3]);

        let result = engine.simple_search("こんにちは", &[], false, 0, 0, &cancel).unwrap();
        assert_eq!(result, vec![1]);
    }
}
