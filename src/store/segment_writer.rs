use std::fs::File;
use std::io::Write;

use chrono::Utc;
use crc32fast::Hasher;

use crate::error::Result;
use crate::store::layout::StoreLayout;
use crate::store::segment_meta::{SegmentHeader, SegmentId, SegmentMeta};

/// Writes a sorted run of key/value entries to an immutable on-disk
/// segment: a length-prefixed header (entry count + CRC32 checksum of the
/// body) followed by length-prefixed `(key, value)` pairs.
pub struct SegmentWriter {
    id: SegmentId,
    body: Vec<u8>,
    file: File,
    entry_count: u32,
}

impl SegmentWriter {
    pub fn create(layout: &StoreLayout, id: SegmentId) -> Result<Self> {
        let file = File::create(layout.segment_path(&id))?;
        Ok(SegmentWriter { id, body: Vec::with_capacity(64 * 1024), file, entry_count: 0 })
    }

    /// `entries` must already be sorted by key.
    pub fn write_sorted(mut self, entries: &[(Vec<u8>, u8)]) -> Result<SegmentMeta> {
        for (key, value) in entries {
            self.body.extend_from_slice(&(key.len() as u32).to_le_bytes());
            self.body.extend_from_slice(key);
            self.body.push(*value);
            self.entry_count += 1;
        }
        self.finish()
    }

    fn finish(self) -> Result<SegmentMeta> {
        let mut hasher = Hasher::new();
        hasher.update(&self.body);

        let mut header = SegmentHeader::new(self.entry_count);
        header.checksum = hasher.finalize();
        let header_bytes = bincode::serialize(&header)?;

        let mut file = self.file;
        file.write_all(&(header_bytes.len() as u32).to_le_bytes())?;
        file.write_all(&header_bytes)?;
        file.write_all(&self.body)?;
        file.sync_all()?;

        Ok(SegmentMeta {
            id: self.id,
            entry_count: self.entry_count,
            created_at: Utc::now(),
            size_bytes: file.metadata()?.len() as usize,
        })
    }
}
