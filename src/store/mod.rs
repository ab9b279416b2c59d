pub mod cache;
pub mod checkpoint;
pub mod kv;
pub mod layout;
pub mod lsm;
pub mod maintainer;
pub mod memtable;
pub mod merge_policy;
pub mod segment_meta;
pub mod segment_reader;
pub mod segment_writer;
pub mod wal;

pub use kv::{KvIterator, OrderedStore, LIVE, TOMBSTONE};
pub use lsm::LsmStore;
