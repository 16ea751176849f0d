use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use crate::batch::{Batch, BatchOp};
use crate::error::StoreError;
use crate::store::{KeyRange, KvIter, ScanDirection, Store};

const TABLE: TableDefinition<'static, &'static [u8], &'static [u8]> = TableDefinition::new("deebee");

type RawEntry = (
    redb::AccessGuard<'static, &'static [u8]>,
    redb::AccessGuard<'static, &'static [u8]>,
);

fn storage_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Storage(e.to_string())
}

fn decode_entry(
    entry: Result<RawEntry, redb::StorageError>,
) -> Result<(Vec<u8>, Vec<u8>), StoreError> {
    let (k, v) = entry.map_err(storage_err)?;
    Ok((k.value().to_vec(), v.value().to_vec()))
}

/// Persistent store backed by a single redb table.
///
/// Each [`Batch`] is one redb write transaction, so batches are atomic
/// and durable once `write` returns.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(storage_err)?;

        // Make sure the table exists so read transactions can open it.
        let txn = db.begin_write().map_err(storage_err)?;
        txn.open_table(TABLE).map_err(storage_err)?;
        txn.commit().map_err(storage_err)?;

        tracing::debug!(path = %path.display(), "opened redb store");
        Ok(Self { db })
    }
}

impl Store for RedbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let txn = self.db.begin_read().map_err(storage_err)?;
        let table = txn.open_table(TABLE).map_err(storage_err)?;
        let value = table.get(key).map_err(storage_err)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn write(&self, batch: Batch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = txn.open_table(TABLE).map_err(storage_err)?;
            for op in batch {
                match op {
                    BatchOp::Put { key, value } => {
                        table
                            .insert(key.as_slice(), value.as_slice())
                            .map_err(storage_err)?;
                    }
                    BatchOp::Delete { key } => {
                        table.remove(key.as_slice()).map_err(storage_err)?;
                    }
                }
            }
        }
        txn.commit().map_err(storage_err)
    }

    fn range(&self, range: &KeyRange, direction: ScanDirection) -> Result<KvIter<'_>, StoreError> {
        if range.is_empty() {
            return Ok(Box::new(std::iter::empty()));
        }
        let txn = self.db.begin_read().map_err(storage_err)?;
        let table = txn.open_table(TABLE).map_err(storage_err)?;

        // ReadOnlyTable::range() returns Range<'static>: it keeps the read
        // transaction alive on its own.
        let entries = match &range.end {
            Some(end) => table.range::<&[u8]>(range.start.as_slice()..end.as_slice()),
            None => table.range::<&[u8]>(range.start.as_slice()..),
        }
        .map_err(storage_err)?;

        let iter: KvIter<'_> = match direction {
            ScanDirection::Forward => Box::new(entries.map(decode_entry)),
            ScanDirection::Reverse => Box::new(entries.rev().map(decode_entry)),
        };
        Ok(iter)
    }
}
