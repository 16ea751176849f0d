//! Key layout inside one store, partitioned by collection.
//!
//! - documents: `{collection}\0d\0{enc(_id)}` → bson document bytes
//! - index entries: `{collection}\0i\0{index}\0{enc(f1)}..{enc(fn)}{enc(_id)}` → `enc(_id)`
//! - index catalog: `{collection}\0m\0indexes` → bson `{ indexes: [{ name, fields }] }`
//!
//! Collection and index names never contain `\0`, so one collection's
//! sub-ranges cannot overlap another's.

const SEP: u8 = 0x00;
const DOCUMENT_TAG: u8 = b'd';
const INDEX_TAG: u8 = b'i';
const META_TAG: u8 = b'm';
const INDEX_CATALOG: &[u8] = b"indexes";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Key<'a> {
    /// One primary entry.
    Document { collection: &'a str, id: &'a [u8] },
    /// Prefix of every primary entry in a collection.
    Documents { collection: &'a str },
    /// Prefix of every entry of one index.
    Index { collection: &'a str, index: &'a str },
    IndexCatalog { collection: &'a str },
}

impl Key<'_> {
    pub(crate) fn encode(&self) -> Vec<u8> {
        match *self {
            Key::Document { collection, id } => {
                let mut buf = partition(collection, DOCUMENT_TAG, id.len());
                buf.extend_from_slice(id);
                buf
            }
            Key::Documents { collection } => partition(collection, DOCUMENT_TAG, 0),
            Key::Index { collection, index } => {
                let mut buf = partition(collection, INDEX_TAG, index.len() + 1);
                buf.extend_from_slice(index.as_bytes());
                buf.push(SEP);
                buf
            }
            Key::IndexCatalog { collection } => {
                let mut buf = partition(collection, META_TAG, INDEX_CATALOG.len());
                buf.extend_from_slice(INDEX_CATALOG);
                buf
            }
        }
    }
}

fn partition(collection: &str, tag: u8, extra: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(collection.len() + 3 + extra);
    buf.extend_from_slice(collection.as_bytes());
    buf.push(SEP);
    buf.push(tag);
    buf.push(SEP);
    buf
}
