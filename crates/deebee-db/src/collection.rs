use std::sync::{Arc, Mutex, MutexGuard};

use bson::{Bson, Document};
use deebee_query::{Filter, FilterClause, parse_filter};
use deebee_store::{Batch, ScanDirection, Store};

use crate::cursor::Cursor;
use crate::database::Shared;
use crate::encoding;
use crate::error::DbError;
use crate::index::{self, IndexDefinition};
use crate::key::Key;

/// A handle to one named collection.
///
/// Handles are cheap to clone. Inserts and index builds on the same
/// collection are serialized through a write gate shared by every handle
/// from the same [`Database`](crate::Database); reads take no locks.
pub struct Collection<S: Store> {
    shared: Arc<Shared<S>>,
    name: Arc<str>,
    gate: Arc<Mutex<()>>,
}

impl<S: Store> Collection<S> {
    pub(crate) fn new(shared: Arc<Shared<S>>, name: &str, gate: Arc<Mutex<()>>) -> Self {
        Self {
            shared,
            name: Arc::from(name),
            gate,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn store(&self) -> &S {
        &self.shared.store
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, DbError> {
        self.gate
            .lock()
            .map_err(|_| DbError::GatePoisoned(self.name.to_string()))
    }

    /// Store a document and its entries in every index, atomically.
    ///
    /// A missing `_id` is filled with a fresh `ObjectId` placed first.
    /// Returns the document as stored.
    pub fn insert(&self, doc: Document) -> Result<Document, DbError> {
        let doc = self.with_id(doc);
        let id = match doc.get("_id") {
            Some(Bson::Array(_)) => {
                return Err(DbError::InvalidId("_id cannot be an array".into()));
            }
            Some(id) => id,
            None => return Err(DbError::InvalidId("missing _id".into())),
        };
        let id_bytes = encoding::encode(id)?;
        let bytes = bson::serialize_to_vec(&doc)?;
        let key = Key::Document {
            collection: &self.name,
            id: &id_bytes,
        }
        .encode();

        let _gate = self.lock()?;
        if self.store().get(&key)?.is_some() {
            return Err(DbError::DuplicateId(id.clone()));
        }
        // Read under the gate so a concurrent index build is either fully
        // visible here or has not started.
        let indexes = self.list_indexes()?;
        let entries = index::index_entries(&self.name, &indexes, &doc, &id_bytes)?;

        let mut batch = Batch::with_capacity(entries.len() + 1);
        batch.put(key, bytes);
        for (key, value) in entries {
            batch.put(key, value);
        }
        let ops = batch.len();
        self.store().write(batch)?;
        tracing::trace!(collection = %self.name, ops, "inserted document");
        Ok(doc)
    }

    fn with_id(&self, doc: Document) -> Document {
        if doc.contains_key("_id") {
            return doc;
        }
        let mut with_id = Document::new();
        with_id.insert("_id", self.shared.ids.next_id());
        for (key, value) in doc {
            with_id.insert(key, value);
        }
        with_id
    }

    /// A lazy query over the documents matching `filter`.
    ///
    /// The filter is parsed here; nothing is read until the cursor resolves.
    pub fn find(&self, filter: Document) -> Result<Cursor<S>, DbError> {
        let filter = parse_filter(&filter)?;
        Ok(Cursor::new(self.clone(), filter))
    }

    /// First document matching `filter`.
    ///
    /// A lone `_id` equality is a point read of the document key.
    pub fn find_one(&self, filter: Document) -> Result<Option<Document>, DbError> {
        let filter = parse_filter(&filter)?;
        if let Some(id_bytes) = point_id(&filter) {
            let key = Key::Document {
                collection: &self.name,
                id: &id_bytes,
            }
            .encode();
            tracing::trace!(collection = %self.name, "find_one by _id");
            return match self.store().get(&key)? {
                Some(bytes) => Ok(Some(bson::deserialize_from_slice::<Document>(&bytes)?)),
                None => Ok(None),
            };
        }
        let cursor = Cursor::new(self.clone(), filter).limit(1);
        cursor.iter()?.next().transpose()
    }

    /// Define an index over `fields` and backfill it from existing documents.
    ///
    /// Re-creating an index with the same fields returns the existing
    /// definition without rebuilding.
    pub fn create_index<I, F>(&self, fields: I) -> Result<IndexDefinition, DbError>
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        let index = IndexDefinition::new(fields)?;

        let _gate = self.lock()?;
        let mut indexes = self.list_indexes()?;
        if let Some(existing) = indexes.iter().find(|i| i.name() == index.name()) {
            if existing.fields() == index.fields() {
                tracing::debug!(collection = %self.name, index = index.name(), "index already exists");
                return Ok(existing.clone());
            }
            return Err(DbError::IndexConflict {
                name: index.name().to_string(),
            });
        }

        let batch_size = self.shared.config.index_build_batch_size.max(1);
        let prefix = Key::Documents {
            collection: &self.name,
        }
        .encode();
        let mut batch = Batch::new();
        let mut pending = 0;
        let mut documents = 0usize;
        let mut entries = 0usize;

        for entry in self.store().scan_prefix(&prefix, ScanDirection::Forward)? {
            let (key, bytes) = entry?;
            let doc: Document = bson::deserialize_from_slice(&bytes)?;
            let id = key.get(prefix.len()..).unwrap_or_default();
            for (key, value) in
                index::index_entries(&self.name, std::slice::from_ref(&index), &doc, id)?
            {
                batch.put(key, value);
                entries += 1;
            }
            documents += 1;
            pending += 1;
            if pending >= batch_size {
                self.store().write(std::mem::take(&mut batch))?;
                pending = 0;
            }
        }

        // The catalog goes in last: until it lands, queries ignore the index.
        indexes.push(index.clone());
        let (key, value) = index::catalog_entry(&self.name, &indexes)?;
        batch.put(key, value);
        self.store().write(batch)?;

        tracing::info!(
            collection = %self.name,
            index = index.name(),
            documents,
            entries,
            "built index"
        );
        Ok(index)
    }

    /// Index definitions in creation order.
    pub fn list_indexes(&self) -> Result<Vec<IndexDefinition>, DbError> {
        index::load_catalog(self.store(), &self.name)
    }
}

impl<S: Store> Clone for Collection<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            name: Arc::clone(&self.name),
            gate: Arc::clone(&self.gate),
        }
    }
}

/// Encoded `_id` when `filter` is a single equality on a scalar `_id`.
///
/// Null also matches a missing field and arrays match by element, so both
/// go through the cursor.
fn point_id(filter: &Filter) -> Option<Vec<u8>> {
    let [condition] = filter.conditions() else {
        return None;
    };
    if condition.field != "_id" {
        return None;
    }
    match &condition.clause {
        FilterClause::Eq(Bson::Null | Bson::Array(_)) => None,
        FilterClause::Eq(value) => encoding::encode(value).ok(),
        _ => None,
    }
}
