use std::collections::BTreeMap;

use parking_lot::RwLock;

/// In-memory sorted store backing the most recent, not-yet-flushed writes.
/// Tombstones (`value == 1`) are kept, not removed, so a flush can shadow
/// an older on-disk value for the same key.
#[derive(Default)]
pub struct Memtable {
    entries: RwLock<BTreeMap<Vec<u8>, u8>>,
}

impl Memtable {
    pub fn new() -> Self {
        Memtable { entries: RwLock::new(BTreeMap::new()) }
    }

    pub fn insert(&self, key: Vec<u8>, value: u8) {
        self.entries.write().insert(key, value);
    }

    pub fn get(&self, key: &[u8]) -> Option<u8> {
        self.entries.read().get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drains the memtable into a sorted vector, for flushing to a segment.
    pub fn drain_sorted(&self) -> Vec<(Vec<u8>, u8)> {
        std::mem::take(&mut *self.entries.write()).into_iter().collect()
    }

    pub fn snapshot(&self) -> Vec<(Vec<u8>, u8)> {
        self.entries.read().iter().map(|(k, v)| (k.clone(), *v)).collect()
    }
}
