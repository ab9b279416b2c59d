use std::fs;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::layout::StoreLayout;
use crate::store::segment_meta::SegmentMeta;

/// Durable record of which segments exist and where the WAL can be
/// truncated from, so recovery does not need to replay the entire WAL
/// history on every restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub wal_sequence: u64,
    pub segments: Vec<SegmentMeta>,
    pub timestamp: DateTime<Utc>,
}

impl Checkpoint {
    pub fn load(layout: &StoreLayout) -> Result<Option<Self>> {
        let path = layout.checkpoint_path();
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read(path)?;
        Ok(Some(bincode::deserialize(&data)?))
    }

    pub fn save(&self, layout: &StoreLayout) -> Result<()> {
        let data = bincode::serialize(self)?;
        fs::write(layout.checkpoint_path(), data)?;
        Ok(())
    }
}
