use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use imbl::OrdMap;

use crate::batch::{Batch, BatchOp};
use crate::error::StoreError;
use crate::store::{KeyRange, KvIter, ScanDirection, Store};

use super::range::SnapshotRange;

pub(crate) type Tree = OrdMap<Vec<u8>, Vec<u8>>;

const DEFAULT_SCAN_CHUNK: usize = 64;

/// In-memory ordered store.
///
/// Readers load the current tree without locking; writers clone it
/// (cheap, imbl shares structure), apply the batch and swap it in.
/// A single mutex serializes writers so batches never interleave.
pub struct MemoryStore {
    data: ArcSwap<Tree>,
    write_lock: Mutex<()>,
    scan_chunk: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: ArcSwap::new(Arc::new(OrdMap::new())),
            write_lock: Mutex::new(()),
            scan_chunk: DEFAULT_SCAN_CHUNK,
        }
    }

    /// Number of entries a range scan pulls from its snapshot per refill.
    pub fn with_scan_chunk_size(mut self, chunk: usize) -> Self {
        self.scan_chunk = chunk.max(1);
        self
    }

    pub fn len(&self) -> usize {
        self.data.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.load().is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.data.load().get(key).cloned())
    }

    fn write(&self, batch: Batch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::LockPoisoned)?;

        let ops = batch.len();
        let mut tree = (**self.data.load()).clone();
        for op in batch {
            match op {
                BatchOp::Put { key, value } => {
                    tree.insert(key, value);
                }
                BatchOp::Delete { key } => {
                    tree.remove(&key);
                }
            }
        }
        self.data.store(Arc::new(tree));
        tracing::trace!(ops, "memory batch applied");
        Ok(())
    }

    fn range(&self, range: &KeyRange, direction: ScanDirection) -> Result<KvIter<'_>, StoreError> {
        if range.is_empty() {
            return Ok(Box::new(std::iter::empty()));
        }
        let snapshot = self.data.load_full();
        Ok(Box::new(
            SnapshotRange::new(snapshot, range, direction, self.scan_chunk).map(Ok),
        ))
    }
}
