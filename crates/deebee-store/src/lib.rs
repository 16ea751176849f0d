mod batch;
mod error;
mod store;

pub use batch::{Batch, BatchOp};
pub use error::StoreError;
pub use store::{KeyRange, KvIter, ScanDirection, Store, increment_prefix};

#[cfg(feature = "memory")]
mod memory;

#[cfg(feature = "memory")]
pub use memory::MemoryStore;

#[cfg(feature = "redb")]
mod redb_store;

#[cfg(feature = "redb")]
pub use redb_store::RedbStore;
