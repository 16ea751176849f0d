use bson::Document;
use deebee_store::Store;

use crate::error::DbError;
use crate::executor::{DocIter, IdIter};
use crate::key::Key;

/// Point-read the document behind each `_id`.
pub(crate) fn execute<'a, S: Store>(
    store: &'a S,
    collection: &'a str,
    ids: IdIter<'a>,
) -> DocIter<'a> {
    Box::new(ids.filter_map(move |result| -> Option<Result<Document, DbError>> {
        let id = match result {
            Ok(id) => id,
            Err(e) => return Some(Err(e)),
        };
        let key = Key::Document {
            collection,
            id: &id,
        }
        .encode();
        match store.get(&key) {
            Ok(Some(bytes)) => {
                Some(bson::deserialize_from_slice::<Document>(&bytes).map_err(DbError::from))
            }
            Ok(None) => {
                tracing::warn!(collection, "index entry without a document");
                None
            }
            Err(e) => Some(Err(e.into())),
        }
    }))
}
