use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique on-disk segment identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentId(pub Uuid);

impl SegmentId {
    pub fn new() -> Self {
        SegmentId(Uuid::new_v4())
    }
}

impl Default for SegmentId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentMeta {
    pub id: SegmentId,
    pub entry_count: u32,
    pub created_at: DateTime<Utc>,
    pub size_bytes: usize,
}

/// Fixed-size segment file header, written before the sorted key/value
/// block and checksummed over it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentHeader {
    pub version: u32,
    pub entry_count: u32,
    pub checksum: u32,
}

impl SegmentHeader {
    pub const VERSION: u32 = 1;

    pub fn new(entry_count: u32) -> Self {
        SegmentHeader { version: Self::VERSION, entry_count, checksum: 0 }
    }
}
