use std::collections::BTreeSet;

use bson::{Bson, Document};
use deebee_store::Store;
use serde::{Deserialize, Serialize};

use crate::encoding::{self, EncodingError};
use crate::error::DbError;
use crate::key::Key;
use crate::path;

const NAME_SEPARATOR: &str = ",";

/// An ordered list of indexed fields. The name is the fields joined by `,`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    name: String,
    fields: Vec<String>,
}

impl IndexDefinition {
    pub fn new<I, F>(fields: I) -> Result<Self, DbError>
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        validate_fields(&fields)?;
        Ok(Self {
            name: fields.join(NAME_SEPARATOR),
            fields,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

fn validate_fields(fields: &[String]) -> Result<(), DbError> {
    if fields.is_empty() {
        return Err(DbError::InvalidIndexFields(
            "an index needs at least one field".into(),
        ));
    }
    let mut seen = BTreeSet::new();
    for field in fields {
        if field.split('.').any(str::is_empty) {
            return Err(DbError::InvalidIndexFields(format!(
                "field {field:?} has an empty path segment"
            )));
        }
        if field.contains(NAME_SEPARATOR) || field.contains('\0') {
            return Err(DbError::InvalidIndexFields(format!(
                "field {field:?} contains a reserved character"
            )));
        }
        if field.starts_with('$') {
            return Err(DbError::InvalidIndexFields(format!(
                "field {field:?} starts with '$'"
            )));
        }
        if !seen.insert(field.as_str()) {
            return Err(DbError::InvalidIndexFields(format!(
                "field {field:?} appears more than once"
            )));
        }
    }
    Ok(())
}

/// Encodings one field contributes to an index position.
///
/// - absent: the absent sentinel
/// - array: one encoding per distinct element; an empty array contributes
///   itself so the document still reads as present
/// - anything else: its own encoding
pub(crate) fn position_values(doc: &Document, field: &str) -> Result<Vec<Vec<u8>>, EncodingError> {
    let values = path::resolve(doc, field);
    if values.is_empty() {
        return Ok(vec![encoding::ABSENT.to_vec()]);
    }
    let mut out = BTreeSet::new();
    for value in values {
        match value {
            Bson::Array(items) if !items.is_empty() => {
                for item in items {
                    out.insert(encoding::encode(item)?);
                }
            }
            other => {
                out.insert(encoding::encode(other)?);
            }
        }
    }
    Ok(out.into_iter().collect())
}

/// The value part of every entry `doc` contributes to `index`: the
/// cartesian product of each position's values, concatenated.
pub(crate) fn entry_values(
    index: &IndexDefinition,
    doc: &Document,
) -> Result<Vec<Vec<u8>>, EncodingError> {
    let mut combos: Vec<Vec<u8>> = vec![Vec::new()];
    for field in index.fields() {
        let values = position_values(doc, field)?;
        combos = combos
            .iter()
            .flat_map(|prefix| {
                values.iter().map(move |value| {
                    let mut key = Vec::with_capacity(prefix.len() + value.len());
                    key.extend_from_slice(prefix);
                    key.extend_from_slice(value);
                    key
                })
            })
            .collect();
    }
    Ok(combos)
}

/// Compute the `(key, value)` pairs `doc` adds to every index in `indexes`.
pub(crate) fn index_entries(
    collection: &str,
    indexes: &[IndexDefinition],
    doc: &Document,
    id: &[u8],
) -> Result<Vec<(Vec<u8>, Vec<u8>)>, EncodingError> {
    let mut entries = Vec::new();
    for index in indexes {
        let prefix = Key::Index {
            collection,
            index: index.name(),
        }
        .encode();
        for values in entry_values(index, doc)? {
            let mut key = Vec::with_capacity(prefix.len() + values.len() + id.len());
            key.extend_from_slice(&prefix);
            key.extend_from_slice(&values);
            key.extend_from_slice(id);
            entries.push((key, id.to_vec()));
        }
    }
    Ok(entries)
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexCatalog {
    indexes: Vec<IndexDefinition>,
}

/// Index definitions of a collection, in creation order.
pub(crate) fn load_catalog<S: Store>(
    store: &S,
    collection: &str,
) -> Result<Vec<IndexDefinition>, DbError> {
    let key = Key::IndexCatalog { collection }.encode();
    match store.get(&key)? {
        Some(bytes) => {
            let catalog: IndexCatalog = bson::deserialize_from_slice(&bytes)?;
            Ok(catalog.indexes)
        }
        None => Ok(Vec::new()),
    }
}

/// Catalog entry to write alongside a new index.
pub(crate) fn catalog_entry(
    collection: &str,
    indexes: &[IndexDefinition],
) -> Result<(Vec<u8>, Vec<u8>), DbError> {
    let catalog = IndexCatalog {
        indexes: indexes.to_vec(),
    };
    let key = Key::IndexCatalog { collection }.encode();
    Ok((key, bson::serialize_to_vec(&catalog)?))
}
