use bson::Document;
use deebee_store::{ScanDirection, Store};

use crate::error::DbError;
use crate::executor::DocIter;
use crate::key::Key;

/// Every document of the collection, in `_id` order.
pub(crate) fn execute<'a, S: Store>(
    store: &'a S,
    collection: &str,
    direction: ScanDirection,
) -> Result<DocIter<'a>, DbError> {
    let prefix = Key::Documents { collection }.encode();
    let entries = store.scan_prefix(&prefix, direction)?;
    Ok(Box::new(entries.map(|entry| -> Result<Document, DbError> {
        let (_, bytes) = entry?;
        Ok(bson::deserialize_from_slice::<Document>(&bytes)?)
    })))
}
