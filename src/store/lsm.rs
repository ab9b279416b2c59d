use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};

use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::store::cache::BlockCache;
use crate::store::checkpoint::Checkpoint;
use crate::store::kv::{KvIterator, OrderedStore, LIVE, TOMBSTONE};
use crate::store::layout::StoreLayout;
use crate::store::maintainer::Maintainer;
use crate::store::memtable::Memtable;
use crate::store::merge_policy::MergePolicy;
use crate::store::segment_meta::{SegmentId, SegmentMeta};
use crate::store::segment_reader::SegmentReader;
use crate::store::segment_writer::SegmentWriter;
use crate::store::wal::{Wal, WalOp};

/// Reference [`OrderedStore`] implementation: an in-memory memtable backed
/// by a write-ahead log, flushed periodically to immutable sorted
/// segments, merged in the background under a pluggable [`MergePolicy`].
pub struct LsmStore {
    layout: StoreLayout,
    memtable: Memtable,
    wal: Mutex<Wal>,
    segments: RwLock<Vec<SegmentMeta>>,
    cache: BlockCache,
    merge_policy: Box<dyn MergePolicy>,
    writer_batch_size: usize,
    maintainer: Mutex<Option<Maintainer>>,
    read_only: AtomicBool,
}

impl LsmStore {
    pub fn open(base_dir: PathBuf, config: &IndexConfig, merge_policy: Box<dyn MergePolicy>) -> Result<Arc<Self>> {
        let layout = StoreLayout::new(base_dir)?;
        let checkpoint = Checkpoint::load(&layout)?;
        let (segments, wal_sequence) = match checkpoint {
            Some(cp) => (cp.segments, cp.wal_sequence),
            None => (Vec::new(), 0),
        };

        let memtable = Memtable::new();
        let recovered = Wal::replay(&layout, wal_sequence)?;
        if !recovered.is_empty() {
            println!("lsm: replaying {} WAL entries from sequence {}", recovered.len(), wal_sequence);
        }
        for op in recovered {
            let WalOp::Put { key, value } = op;
            memtable.insert(key, value);
        }
        let wal = Wal::open(&layout, wal_sequence)?;

        let store = Arc::new(LsmStore {
            layout,
            memtable,
            wal: Mutex::new(wal),
            segments: RwLock::new(segments),
            cache: BlockCache::new(config.block_cache_capacity, config.block_cache_lifetime),
            merge_policy,
            writer_batch_size: config.writer_batch_size,
            maintainer: Mutex::new(None),
            read_only: AtomicBool::new(false),
        });
        store.spawn_maintainer();
        Ok(store)
    }

    fn spawn_maintainer(self: &Arc<Self>) {
        let worker = self.clone();
        let maintainer = Maintainer::spawn(Duration::from_secs(30), move || {
            if let Err(err) = worker.maybe_flush() {
                eprintln!("lsm: background flush failed: {err}");
            }
            if let Err(err) = worker.maybe_compact() {
                eprintln!("lsm: background compaction failed: {err}");
            }
        });
        *self.maintainer.lock() = Some(maintainer);
    }

    fn maybe_flush(&self) -> Result<()> {
        if self.memtable.len() < self.writer_batch_size {
            return Ok(());
        }
        self.flush_locked()
    }

    fn flush_locked(&self) -> Result<()> {
        if self.memtable.is_empty() {
            return Ok(());
        }
        let entries = self.memtable.drain_sorted();
        let count = entries.len();
        let id = SegmentId::new();
        let writer = SegmentWriter::create(&self.layout, id)?;
        let meta = writer.write_sorted(&entries)?;
        self.segments.write().push(meta);
        self.save_checkpoint()?;
        println!("lsm: flushed {count} entries to segment {}", id.0);
        Ok(())
    }

    fn maybe_compact(&self) -> Result<()> {
        let segments = self.segments.read().clone();
        if !self.merge_policy.should_merge(&segments) {
            return Ok(());
        }
        let mut to_merge = self.merge_policy.select_segments_to_merge(&segments);
        if to_merge.len() < 2 {
            return Ok(());
        }
        to_merge.sort_by_key(|s| s.created_at);
        self.compact(&to_merge)
    }

    fn compact(&self, to_merge: &[SegmentMeta]) -> Result<()> {
        let mut merged: BTreeMap<Vec<u8>, u8> = BTreeMap::new();
        for meta in to_merge {
            for (k, v) in self.load_segment(meta.id)?.iter() {
                merged.insert(k.clone(), *v);
            }
        }
        let merged_entries: Vec<(Vec<u8>, u8)> = merged.into_iter().collect();

        let new_id = SegmentId::new();
        let writer = SegmentWriter::create(&self.layout, new_id)?;
        let new_meta = writer.write_sorted(&merged_entries)?;

        let merged_ids: HashSet<SegmentId> = to_merge.iter().map(|s| s.id).collect();
        {
            let mut segments = self.segments.write();
            segments.retain(|s| !merged_ids.contains(&s.id));
            segments.push(new_meta);
        }
        for meta in to_merge {
            self.cache.invalidate(meta.id);
            let _ = std::fs::remove_file(self.layout.segment_path(&meta.id));
        }
        self.save_checkpoint()?;
        println!("lsm: compacted {} segments into {}", to_merge.len(), new_id.0);
        Ok(())
    }

    fn save_checkpoint(&self) -> Result<()> {
        let checkpoint = Checkpoint {
            wal_sequence: self.wal.lock().sequence(),
            segments: self.segments.read().clone(),
            timestamp: Utc::now(),
        };
        checkpoint.save(&self.layout)
    }

    fn load_segment(&self, id: SegmentId) -> Result<Arc<Vec<(Vec<u8>, u8)>>> {
        if let Some(cached) = self.cache.get(id) {
            return Ok(cached);
        }
        let entries = Arc::new(SegmentReader::read_all(&self.layout, id)?);
        self.cache.insert(id, entries.clone());
        Ok(entries)
    }

    /// Merges the memtable over every on-disk segment (oldest to newest,
    /// memtable last) into one sorted, tombstone-free snapshot.
    fn build_snapshot(&self) -> Result<Arc<Vec<(Vec<u8>, u8)>>> {
        let mut segments = self.segments.read().clone();
        segments.sort_by_key(|s| s.created_at);

        let mut merged: BTreeMap<Vec<u8>, u8> = BTreeMap::new();
        for meta in &segments {
            for (k, v) in self.load_segment(meta.id)?.iter() {
                merged.insert(k.clone(), *v);
            }
        }
        for (k, v) in self.memtable.snapshot() {
            merged.insert(k, v);
        }

        let snapshot: Vec<(Vec<u8>, u8)> = merged.into_iter().filter(|(_, v)| *v != TOMBSTONE).collect();
        Ok(Arc::new(snapshot))
    }
}

struct SnapshotIterator {
    entries: Arc<Vec<(Vec<u8>, u8)>>,
    pos: Option<usize>,
    forward: bool,
}

impl SnapshotIterator {
    fn forward(entries: Arc<Vec<(Vec<u8>, u8)>>) -> Self {
        SnapshotIterator { entries, pos: Some(0), forward: true }
    }

    fn backward(entries: Arc<Vec<(Vec<u8>, u8)>>) -> Self {
        let len = entries.len();
        SnapshotIterator { entries, pos: Some(len), forward: false }
    }
}

impl KvIterator for SnapshotIterator {
    fn seek(&mut self, key: &[u8]) {
        if self.forward {
            self.pos = Some(self.entries.partition_point(|(k, _)| k.as_slice() < key));
        } else {
            self.pos = Some(self.entries.partition_point(|(k, _)| k.as_slice() <= key));
        }
    }

    fn next(&mut self) -> Option<(Vec<u8>, u8)> {
        if self.forward {
            let idx = self.pos?;
            if idx >= self.entries.len() {
                return None;
            }
            self.pos = Some(idx + 1);
            Some(self.entries[idx].clone())
        } else {
            let idx = self.pos?;
            if idx == 0 {
                return None;
            }
            self.pos = Some(idx - 1);
            Some(self.entries[idx - 1].clone())
        }
    }
}

impl OrderedStore for LsmStore {
    fn upsert(&self, key: &[u8], value: u8) -> Result<()> {
        if self.is_read_only() {
            return Err(Error::read_only());
        }
        self.wal.lock().append(WalOp::Put { key: key.to_vec(), value })?;
        self.memtable.insert(key.to_vec(), value);
        self.maybe_flush()
    }

    fn try_add(&self, key: &[u8], value: u8) -> Result<bool> {
        if self.is_read_only() {
            return Err(Error::read_only());
        }
        if self.try_get(key)?.is_some() {
            return Ok(false);
        }
        self.upsert(key, value)?;
        Ok(true)
    }

    fn force_delete(&self, key: &[u8]) -> Result<()> {
        self.upsert(key, TOMBSTONE)
    }

    fn try_get(&self, key: &[u8]) -> Result<Option<u8>> {
        if let Some(v) = self.memtable.get(key) {
            return Ok(if v == TOMBSTONE { None } else { Some(v) });
        }
        let mut segments = self.segments.read().clone();
        segments.sort_by_key(|s| std::cmp::Reverse(s.created_at));
        for meta in &segments {
            let entries = self.load_segment(meta.id)?;
            if let Ok(idx) = entries.binary_search_by(|(k, _)| k.as_slice().cmp(key)) {
                return Ok(if entries[idx].1 == TOMBSTONE { None } else { Some(entries[idx].1) });
            }
        }
        Ok(None)
    }

    fn forward_iter(&self) -> Result<Box<dyn KvIterator>> {
        Ok(Box::new(SnapshotIterator::forward(self.build_snapshot()?)))
    }

    fn reverse_iter(&self) -> Result<Box<dyn KvIterator>> {
        Ok(Box::new(SnapshotIterator::backward(self.build_snapshot()?)))
    }

    fn evict_to_disk(&self) -> Result<()> {
        self.flush_locked()
    }

    fn try_cancel_background_threads(&self) {
        if let Some(maintainer) = self.maintainer.lock().as_ref() {
            maintainer.try_cancel();
        }
    }

    fn wait_for_background_threads(&self) {
        if let Some(maintainer) = self.maintainer.lock().as_ref() {
            maintainer.wait();
        }
    }

    fn destroy(&self) -> Result<()> {
        self.try_cancel_background_threads();
        self.wait_for_background_threads();
        std::fs::remove_dir_all(&self.layout.base_dir)?;
        Ok(())
    }

    fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::Relaxed)
    }

    fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::merge_policy::TieredMergePolicy;
    use tempfile::tempdir;

    fn open_store(dir: &std::path::Path) -> Arc<LsmStore> {
        let config = IndexConfig::default();
        LsmStore::open(dir.to_path_buf(), &config, Box::new(TieredMergePolicy::default())).unwrap()
    }

    #[test]
    fn upsert_and_get_roundtrip() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.upsert(b"k1", LIVE).unwrap();
        assert_eq!(store.try_get(b"k1").unwrap(), Some(LIVE));
    }

    #[test]
    fn force_delete_hides_key() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.upsert(b"k1", LIVE).unwrap();
        store.force_delete(b"k1").unwrap();
        assert_eq!(store.try_get(b"k1").unwrap(), None);
    }

    #[test]
    fn forward_iterator_seeks_in_order() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.upsert(b"a", LIVE).unwrap();
        store.upsert(b"b", LIVE).unwrap();
        store.upsert(b"c", LIVE).unwrap();

        let mut iter = store.forward_iter().unwrap();
        iter.seek(b"b");
        assert_eq!(iter.next().unwrap().0, b"b".to_vec());
        assert_eq!(iter.next().unwrap().0, b"c".to_vec());
        assert!(iter.next().is_none());
    }

    #[test]
    fn flush_then_read_survives_memtable_drain() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.upsert(b"a", LIVE).unwrap();
        store.evict_to_disk().unwrap();
        assert_eq!(store.try_get(b"a").unwrap(), Some(LIVE));
    }

    #[test]
    fn read_only_rejects_writes() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.set_read_only(true);
        assert!(store.upsert(b"a", LIVE).is_err());
    }
}
