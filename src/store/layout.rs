use std::fs;
use std::path::PathBuf;

use crate::error::Result;
use crate::store::segment_meta::SegmentId;

/// Directory structure for one ordered store's on-disk files.
#[derive(Debug, Clone)]
pub struct StoreLayout {
    pub base_dir: PathBuf,
    pub segments_dir: PathBuf,
    pub wal_dir: PathBuf,
    pub meta_dir: PathBuf,
}

impl StoreLayout {
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        let segments_dir = base_dir.join("segments");
        let wal_dir = base_dir.join("wal");
        let meta_dir = base_dir.join("meta");

        fs::create_dir_all(&segments_dir)?;
        fs::create_dir_all(&wal_dir)?;
        fs::create_dir_all(&meta_dir)?;

        Ok(StoreLayout { base_dir, segments_dir, wal_dir, meta_dir })
    }

    pub fn segment_path(&self, id: &SegmentId) -> PathBuf {
        self.segments_dir.join(format!("{}.seg", id.0))
    }

    pub fn wal_path(&self, sequence: u64) -> PathBuf {
        self.wal_dir.join(format!("wal_{sequence:08}.log"))
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.meta_dir.join("checkpoint.bin")
    }
}
