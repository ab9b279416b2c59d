use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::keys::{FixedKey, PositionalKey, ReverseKey};
use crate::query::ast::QueryNode;
use crate::search::cancel::CancellationToken;
use crate::search::{advanced, simple};
use crate::store::merge_policy::TieredMergePolicy;
use crate::store::{LsmStore, OrderedStore, LIVE};

/// Durable store of positional triples `(token, record, previous_token)`,
/// with an optional reverse `(record, token)` mirror kept for
/// `delete_record`'s O(document-size) path. Owns its backing stores and
/// enforces the `open → read-only → dropped` lifecycle.
pub struct PositionalIndex<R: FixedKey> {
    primary: Arc<dyn OrderedStore>,
    secondary: Option<Arc<dyn OrderedStore>>,
    dropped: AtomicBool,
    _marker: PhantomData<R>,
}

impl<R: FixedKey + Eq + Hash> PositionalIndex<R> {
    pub fn open(config: &IndexConfig) -> Result<Self> {
        let primary = LsmStore::open(config.data_path.join("index1"), config, Box::new(TieredMergePolicy::default()))?;
        let secondary = if config.use_secondary_index {
            Some(LsmStore::open(config.data_path.join("index2"), config, Box::new(TieredMergePolicy::default()))? as Arc<dyn OrderedStore>)
        } else {
            None
        };

        Ok(PositionalIndex { primary: primary as Arc<dyn OrderedStore>, secondary, dropped: AtomicBool::new(false), _marker: PhantomData })
    }

    fn check_open(&self) -> Result<()> {
        if self.is_dropped() {
            return Err(Error::dropped());
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<()> {
        self.check_open()?;
        if self.is_read_only() {
            return Err(Error::read_only());
        }
        Ok(())
    }

    pub fn is_dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }

    pub fn is_read_only(&self) -> bool {
        self.primary.is_read_only()
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.primary.set_read_only(read_only);
        if let Some(secondary) = &self.secondary {
            secondary.set_read_only(read_only);
        }
    }

    pub fn upsert(&self, token: u64, record: R, prev: u64) -> Result<()> {
        self.check_writable()?;
        let key = PositionalKey::<R>::new(token, record, prev).encode();
        self.primary.upsert(&key, LIVE)?;
        if let Some(secondary) = &self.secondary {
            let reverse_key = ReverseKey::<R>::new(record, token).encode();
            secondary.try_add(&reverse_key, LIVE)?;
        }
        Ok(())
    }

    pub fn delete(&self, token: u64, record: R, prev: u64) -> Result<()> {
        self.check_writable()?;
        let key = PositionalKey::<R>::new(token, record, prev).encode();
        self.primary.force_delete(&key)?;

        if let Some(secondary) = &self.secondary {
            if !self.token_record_still_present(token, record)? {
                let reverse_key = ReverseKey::<R>::new(record, token).encode();
                secondary.force_delete(&reverse_key)?;
            }
        }
        Ok(())
    }

    fn token_record_still_present(&self, token: u64, record: R) -> Result<bool> {
        let mut iter = self.primary.forward_iter()?;
        iter.seek(&PositionalKey::<R>::token_record_prefix(token, record));
        match iter.next() {
            Some((key_bytes, _)) => Ok(PositionalKey::<R>::starts_with_token_record(&key_bytes, token, record)),
            None => Ok(false),
        }
    }

    /// Removes every triple whose record component equals `record`.
    /// Dispatches on whether the reverse index is available.
    pub fn delete_record(&self, record: R) -> Result<usize> {
        self.check_writable()?;
        match &self.secondary {
            Some(secondary) => self.delete_record_with_secondary(secondary.as_ref(), record),
            None => self.delete_record_full_scan(record),
        }
    }

    fn delete_record_full_scan(&self, record: R) -> Result<usize> {
        let mut count = 0usize;
        let mut iter = self.primary.forward_iter()?;
        let mut to_delete = Vec::new();
        while let Some((key_bytes, _)) = iter.next() {
            let key = PositionalKey::<R>::decode(&key_bytes);
            if key.record == record {
                to_delete.push(key_bytes);
            }
        }
        for key_bytes in to_delete {
            self.primary.force_delete(&key_bytes)?;
            count += 1;
        }
        Ok(count)
    }

    fn delete_record_with_secondary(&self, secondary: &dyn OrderedStore, record: R) -> Result<usize> {
        let mut reverse_iter = secondary.forward_iter()?;
        reverse_iter.seek(&ReverseKey::<R>::record_prefix(record));

        let mut tokens = Vec::new();
        while let Some((key_bytes, _)) = reverse_iter.next() {
            if !ReverseKey::<R>::starts_with_record(&key_bytes, record) {
                break;
            }
            tokens.push(ReverseKey::<R>::decode(&key_bytes).token);
        }

        let mut count = 0usize;
        for token in tokens {
            let mut primary_iter = self.primary.forward_iter()?;
            primary_iter.seek(&PositionalKey::<R>::token_record_prefix(token, record));
            let mut to_delete = Vec::new();
            while let Some((key_bytes, _)) = primary_iter.next() {
                if !PositionalKey::<R>::starts_with_token_record(&key_bytes, token, record) {
                    break;
                }
                to_delete.push(key_bytes);
            }
            for key_bytes in to_delete {
                self.primary.force_delete(&key_bytes)?;
                count += 1;
            }
            secondary.force_delete(&ReverseKey::<R>::new(record, token).encode())?;
        }

        Ok(count)
    }

    pub fn evict_to_disk(&self) -> Result<()> {
        self.check_open()?;
        self.primary.evict_to_disk()?;
        if let Some(secondary) = &self.secondary {
            secondary.evict_to_disk()?;
        }
        Ok(())
    }

    pub fn try_cancel_background_threads(&self) {
        self.primary.try_cancel_background_threads();
        if let Some(secondary) = &self.secondary {
            secondary.try_cancel_background_threads();
        }
    }

    pub fn wait_for_background_threads(&self) {
        self.primary.wait_for_background_threads();
        if let Some(secondary) = &self.secondary {
            secondary.wait_for_background_threads();
        }
    }

    /// Cancels and waits for background maintenance, then flips the index
    /// read-only. Idempotent: later calls are no-ops. Does not touch the
    /// on-disk tree; see [`Self::dispose`] for that.
    pub fn close(&self) {
        if self.dropped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.try_cancel_background_threads();
        self.wait_for_background_threads();
        self.set_read_only(true);
    }

    /// `close` followed by irreversible destruction of both on-disk trees.
    pub fn dispose(&self) -> Result<()> {
        self.close();
        self.primary.destroy()?;
        if let Some(secondary) = &self.secondary {
            secondary.destroy()?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn simple_search(
        &self,
        tokens: &[u64],
        first_look_at: Option<u64>,
        respect_order: bool,
        facets: &[u64],
        skip: usize,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<R>> {
        self.check_open()?;
        simple::simple_search(self.primary.as_ref(), tokens, first_look_at, respect_order, facets, skip, limit, cancel)
    }

    pub fn search(&self, node: &QueryNode<u64>, skip: usize, limit: usize, cancel: &CancellationToken) -> Result<Vec<R>> {
        self.check_open()?;
        advanced::search(self.primary.as_ref(), node, skip, limit, cancel)
    }
}

impl<R: FixedKey + Eq + Hash> Drop for PositionalIndex<R> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(dir: &std::path::Path, use_secondary: bool) -> IndexConfig {
        IndexConfig::default().with_data_path(dir.to_path_buf()).with_secondary_index(use_secondary)
    }

    #[test]
    fn upsert_then_simple_search_finds_record() {
        let dir = tempdir().unwrap();
        let index: PositionalIndex<u64> = PositionalIndex::open(&config(dir.path(), true)).unwrap();
        index.upsert(42, 1, 0).unwrap();
        let cancel = CancellationToken::new();
        let result = index.simple_search(&[42], None, false, &[], 0, 0, &cancel).unwrap();
        assert_eq!(result, vec![1]);
    }

    #[test]
    fn delete_record_without_secondary_removes_all_triples() {
        let dir = tempdir().unwrap();
        let index: PositionalIndex<u64> = PositionalIndex::open(&config(dir.path(), false)).unwrap();
        index.upsert(1, 7, 0).unwrap();
        index.upsert(2, 7, 1).unwrap();
        let deleted = index.delete_record(7).unwrap();
        assert_eq!(deleted, 2);
        let cancel = CancellationToken::new();
        assert!(index.simple_search(&[1], None, false, &[], 0, 0, &cancel).unwrap().is_empty());
    }

    #[test]
    fn delete_record_with_secondary_removes_all_triples() {
        let dir = tempdir().unwrap();
        let index: PositionalIndex<u64> = PositionalIndex::open(&config(dir.path(), true)).unwrap();
        index.upsert(1, 7, 0).unwrap();
        index.upsert(2, 7, 1).unwrap();
        let deleted = index.delete_record(7).unwrap();
        assert_eq!(deleted, 2);
        let cancel = CancellationToken::new();
        assert!(index.simple_search(&[1], None, false, &[], 0, 0, &cancel).unwrap().is_empty());
    }

    #[test]
    fn dropped_index_rejects_further_operations() {
        let dir = tempdir().unwrap();
        let index: PositionalIndex<u64> = PositionalIndex::open(&config(dir.path(), true)).unwrap();
        index.close();
        assert!(index.is_dropped());
        assert!(index.upsert(1, 1, 0).is_err());
    }

    #[test]
    fn read_only_index_rejects_mutation_but_allows_search() {
        let dir = tempdir().unwrap();
        let index: PositionalIndex<u64> = PositionalIndex::open(&config(dir.path(), true)).unwrap();
        index.upsert(1, 1, 0).unwrap();
        index.set_read_only(true);
        assert!(index.upsert(2, 2, 0).is_err());
        let cancel = CancellationToken::new();
        assert!(index.simple_search(&[1], None, false, &[], 0, 0, &cancel).is_ok());
    }
}
