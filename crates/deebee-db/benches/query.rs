mod common;
use common::*;

use bson::{Bson, DateTime, doc};
use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use deebee_db::{Database, DatabaseConfig};
use deebee_store::MemoryStore;

// ── Inserts ─────────────────────────────────────────────────

fn bench_insert_indexed(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_indexed");
    for n in [1_000, 10_000] {
        let docs = generate_realistic_batch(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter_batched(
                || {
                    let db = Database::open(MemoryStore::new(), DatabaseConfig::default());
                    let coll = db.collection(COLLECTION).unwrap();
                    coll.create_index(["status", "contacts_count"]).unwrap();
                    coll.create_index(["tags"]).unwrap();
                    (coll, docs.clone())
                },
                |(coll, docs)| {
                    for doc in docs {
                        coll.insert(doc).unwrap();
                    }
                },
                BatchSize::PerIteration,
            )
        });
    }
    group.finish();
}

fn bench_create_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_index");
    for n in [1_000, 10_000] {
        let docs = generate_realistic_batch(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter_batched(
                || {
                    let db = Database::open(MemoryStore::new(), DatabaseConfig::default());
                    let coll = db.collection(COLLECTION).unwrap();
                    for doc in docs.clone() {
                        coll.insert(doc).unwrap();
                    }
                    coll
                },
                |coll| coll.create_index(["product", "contacts_count"]).unwrap(),
                BatchSize::PerIteration,
            )
        });
    }
    group.finish();
}

// ── Queries ─────────────────────────────────────────────────

fn bench_query_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_scan");
    for n in [1_000, 10_000] {
        let coll = seeded_collection(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| coll.find(doc! {}).unwrap().count().unwrap())
        });
    }
    group.finish();
}

fn bench_query_unindexed_eq(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_unindexed_eq");
    for n in [1_000, 10_000] {
        let coll = seeded_collection(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                coll.find(doc! { "product": "ProductA" })
                    .unwrap()
                    .count()
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_query_indexed_eq(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_indexed_eq");
    for n in [1_000, 10_000] {
        let coll = seeded_collection(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                coll.find(doc! { "status": "active" })
                    .unwrap()
                    .count()
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_query_compound_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_compound_range");
    for n in [1_000, 10_000] {
        let coll = seeded_collection(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                coll.find(doc! {
                    "status": "active",
                    "contacts_count": { "$gte": 20, "$lt": 40 },
                })
                .unwrap()
                .count()
                .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_query_in_sorted(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_in_sorted");
    for n in [1_000, 10_000] {
        let coll = seeded_collection(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                coll.find(doc! { "status": { "$in": ["active", "snoozed"] } })
                    .unwrap()
                    .sort("contacts_count", -1)
                    .limit(50)
                    .count()
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_query_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_all");
    for n in [1_000, 10_000] {
        let coll = seeded_collection(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                coll.find(doc! { "tags": { "$all": ["churning", "enterprise"] } })
                    .unwrap()
                    .count()
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_query_date_pagination(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_date_pagination");
    let since = Bson::DateTime(DateTime::from_millis(1_720_000_000_000));
    for n in [1_000, 10_000] {
        let coll = seeded_collection(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                coll.find(doc! { "last_contacted_at": { "$gte": since.clone() } })
                    .unwrap()
                    .sort("last_contacted_at", -1)
                    .skip(100)
                    .limit(20)
                    .to_vec()
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_point_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_lookup");
    for n in [1_000, 10_000] {
        let coll = seeded_collection(n);
        let id = format!("rec-{:08}", n / 2);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| coll.find_one(doc! { "_id": id.as_str() }).unwrap())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_insert_indexed,
    bench_create_index,
    bench_query_scan,
    bench_query_unindexed_eq,
    bench_query_indexed_eq,
    bench_query_compound_range,
    bench_query_in_sorted,
    bench_query_all,
    bench_query_date_pagination,
    bench_point_lookup,
);
criterion_main!(benches);
