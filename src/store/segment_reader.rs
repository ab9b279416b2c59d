use std::fs::File;
use std::io::Read;

use crc32fast::Hasher;

use crate::error::{Error, ErrorKind, Result};
use crate::store::layout::StoreLayout;
use crate::store::segment_meta::{SegmentHeader, SegmentId};

/// Reads a segment file fully into memory as a sorted `(key, value)` run,
/// verifying its checksum first. Segments in this embedded store are
/// assumed small enough that "read once into a `Vec`, cache via
/// [`crate::store::cache`]" is the right trade-off rather than random
/// on-disk access.
pub struct SegmentReader;

impl SegmentReader {
    pub fn read_all(layout: &StoreLayout, id: SegmentId) -> Result<Vec<(Vec<u8>, u8)>> {
        let mut file = File::open(layout.segment_path(&id))?;

        let mut len_buf = [0u8; 4];
        file.read_exact(&mut len_buf)?;
        let header_len = u32::from_le_bytes(len_buf) as usize;

        let mut header_buf = vec![0u8; header_len];
        file.read_exact(&mut header_buf)?;
        let header: SegmentHeader = bincode::deserialize(&header_buf)?;

        if header.version != SegmentHeader::VERSION {
            return Err(Error::new(ErrorKind::Parse, "incompatible segment version"));
        }

        let mut body = Vec::new();
        file.read_to_end(&mut body)?;

        let mut hasher = Hasher::new();
        hasher.update(&body);
        if hasher.finalize() != header.checksum {
            return Err(Error::new(ErrorKind::Parse, format!("segment {} failed checksum verification", id.0)));
        }

        let mut entries = Vec::with_capacity(header.entry_count as usize);
        let mut cursor = 0usize;
        for _ in 0..header.entry_count {
            let key_len = u32::from_le_bytes(body[cursor..cursor + 4].try_into().unwrap()) as usize;
            cursor += 4;
            let key = body[cursor..cursor + key_len].to_vec();
            cursor += key_len;
            let value = body[cursor];
            cursor += 1;
            entries.push((key, value));
        }

        Ok(entries)
    }
}
