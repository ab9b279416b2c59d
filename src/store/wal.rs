use std::fs::{File, OpenOptions};
use std::io::{Read, Write};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::layout::StoreLayout;

/// Write-ahead log recording key/value mutations before they land in the
/// memtable, for crash recovery.
pub struct Wal {
    file: File,
    sequence: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalEntry {
    pub sequence: u64,
    pub op: WalOp,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WalOp {
    Put { key: Vec<u8>, value: u8 },
}

impl Wal {
    pub fn open(layout: &StoreLayout, sequence: u64) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(layout.wal_path(sequence))?;
        Ok(Wal { file, sequence })
    }

    pub fn append(&mut self, op: WalOp) -> Result<()> {
        let entry = WalEntry { sequence: self.sequence, op, timestamp: Utc::now() };
        let data = bincode::serialize(&entry)?;
        self.file.write_all(&(data.len() as u32).to_le_bytes())?;
        self.file.write_all(&data)?;
        self.sequence += 1;
        Ok(())
    }

    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Replays every entry persisted at `sequence`'s WAL file from the
    /// beginning; used during recovery.
    pub fn replay(layout: &StoreLayout, sequence: u64) -> Result<Vec<WalOp>> {
        let path = layout.wal_path(sequence);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut file = File::open(path)?;
        let mut ops = Vec::new();
        loop {
            let mut len_buf = [0u8; 4];
            if file.read_exact(&mut len_buf).is_err() {
                break;
            }
            let len = u32::from_le_bytes(len_buf) as usize;
            let mut buf = vec![0u8; len];
            file.read_exact(&mut buf)?;
            let entry: WalEntry = bincode::deserialize(&buf)?;
            ops.push(entry.op);
        }
        Ok(ops)
    }
}
