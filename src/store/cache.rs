use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use crate::store::segment_meta::SegmentId;

struct CacheEntry {
    entries: Arc<Vec<(Vec<u8>, u8)>>,
    loaded_at: Instant,
}

/// LRU cache of decoded segment bodies, keyed by segment id. Entries older
/// than the configured lifetime are treated as misses and reloaded, so a
/// segment replaced by compaction is never served stale past that window.
pub struct BlockCache {
    cache: Mutex<LruCache<SegmentId, CacheEntry>>,
    lifetime: Duration,
}

impl BlockCache {
    pub fn new(capacity: usize, lifetime: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        BlockCache { cache: Mutex::new(LruCache::new(capacity)), lifetime }
    }

    pub fn get(&self, id: SegmentId) -> Option<Arc<Vec<(Vec<u8>, u8)>>> {
        let mut cache = self.cache.lock();
        match cache.get(&id) {
            Some(entry) if entry.loaded_at.elapsed() <= self.lifetime => Some(entry.entries.clone()),
            Some(_) => {
                cache.pop(&id);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, id: SegmentId, entries: Arc<Vec<(Vec<u8>, u8)>>) {
        self.cache.lock().put(id, CacheEntry { entries, loaded_at: Instant::now() });
    }

    pub fn invalidate(&self, id: SegmentId) {
        self.cache.lock().pop(&id);
    }
}
