#![allow(dead_code)]

use bson::{Bson, DateTime, Document};
use deebee_db::{Collection, Database, DatabaseConfig};
use deebee_store::MemoryStore;

pub const COLLECTION: &str = "example";

pub fn temp_db() -> Database<MemoryStore> {
    Database::open(MemoryStore::new(), DatabaseConfig::default())
}

pub fn example(db: &Database<MemoryStore>) -> Collection<MemoryStore> {
    db.collection(COLLECTION).unwrap()
}

pub fn insert_all(coll: &Collection<MemoryStore>, docs: Vec<Document>) -> Vec<Document> {
    docs.into_iter().map(|d| coll.insert(d).unwrap()).collect()
}

/// Midnight UTC on the first day of `month` (1-based) in 2000.
pub fn month_2000(month: usize) -> Bson {
    const DAYS_BEFORE: [i64; 12] = [0, 31, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335];
    const Y2K_MILLIS: i64 = 946_684_800_000;
    Bson::DateTime(DateTime::from_millis(
        Y2K_MILLIS + DAYS_BEFORE[month - 1] * 86_400_000,
    ))
}

pub fn ids(docs: &[Document]) -> Vec<Bson> {
    docs.iter().map(|d| d.get("_id").cloned().unwrap()).collect()
}

pub fn field<'a>(docs: &'a [Document], name: &str) -> Vec<&'a Bson> {
    docs.iter().map(|d| d.get(name).unwrap()).collect()
}
