#![allow(dead_code)]

use bson::{Bson, DateTime, Document, doc};
use deebee_db::{Collection, Database, DatabaseConfig};
use deebee_store::MemoryStore;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

// ── Constants ───────────────────────────────────────────────

pub const COLLECTION: &str = "bench";
pub const STATUSES: &[&str] = &["active", "rejected", "snoozed"];
pub const PRODUCTS: &[&str] = &["ProductA", "ProductB", "ProductC"];
pub const TAGS: &[&str] = &[
    "renewal_due",
    "high_value",
    "churning",
    "new_customer",
    "enterprise",
];

// ── Helpers ─────────────────────────────────────────────────

pub fn generate_realistic_doc(rng: &mut StdRng, seq: usize) -> Document {
    let mut doc = doc! {
        "_id": format!("rec-{seq:08}"),
        "name": format!("Company-{seq}"),
        "status": STATUSES[rng.gen_range(0..STATUSES.len())],
        "contacts_count": rng.gen_range(0_i32..100),
        "product": PRODUCTS[rng.gen_range(0..PRODUCTS.len())],
    };

    let tag_count = rng.gen_range(1..=3);
    let tags: Vec<&str> = (0..tag_count)
        .map(|_| TAGS[rng.gen_range(0..TAGS.len())])
        .collect();
    doc.insert("tags", tags);

    if rng.gen_ratio(7, 10) {
        let epoch_secs = rng.gen_range(1_700_000_000_i64..1_740_000_000);
        doc.insert(
            "last_contacted_at",
            Bson::DateTime(DateTime::from_millis(epoch_secs * 1000)),
        );
    }

    doc
}

pub fn generate_realistic_batch(count: usize) -> Vec<Document> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|i| generate_realistic_doc(&mut rng, i))
        .collect()
}

/// A MemoryStore-backed collection with `n` documents and indexes on
/// `status,contacts_count`, `tags` and `last_contacted_at`.
pub fn seeded_collection(n: usize) -> Collection<MemoryStore> {
    let db = Database::open(MemoryStore::new(), DatabaseConfig::default());
    let coll = db.collection(COLLECTION).unwrap();
    coll.create_index(["status", "contacts_count"]).unwrap();
    coll.create_index(["tags"]).unwrap();
    coll.create_index(["last_contacted_at"]).unwrap();
    for doc in generate_realistic_batch(n) {
        coll.insert(doc).unwrap();
    }
    coll
}
