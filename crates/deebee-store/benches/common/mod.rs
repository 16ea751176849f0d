#![allow(dead_code)]

use deebee_store::{Batch, Store};

/// Generate `n` key-value pairs shaped like primary document entries.
///
/// Keys: `bench\x00d\x00rec-{id}`
/// Values: deterministic ~200 byte payloads
pub fn generate_kv_pairs(n: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
    (0..n)
        .map(|i| {
            let key = format!("bench\x00d\x00rec-{i:06}").into_bytes();
            let value = format!(
                "{{\"_id\":\"rec-{i}\",\"name\":\"User {i}\",\"status\":\"{}\",\"padding\":\"{}\"}}",
                if i % 2 == 0 { "active" } else { "rejected" },
                "x".repeat(120),
            )
            .into_bytes();
            (key, value)
        })
        .collect()
}

pub fn to_batch(pairs: &[(Vec<u8>, Vec<u8>)]) -> Batch {
    let mut batch = Batch::with_capacity(pairs.len());
    for (k, v) in pairs {
        batch.put(k.clone(), v.clone());
    }
    batch
}

pub fn seed_store<S: Store>(store: &S, n: usize) {
    store.write(to_batch(&generate_kv_pairs(n))).unwrap();
}
