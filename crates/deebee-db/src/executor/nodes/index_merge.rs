use std::collections::HashSet;

use deebee_store::{ScanDirection, Store};

use crate::error::DbError;
use crate::executor::IdIter;
use crate::planner::ScanRange;

/// De-duplicate `ids` and keep only those present in every `required` set.
///
/// Multikey indexes list a document once per matching element, so the same
/// `_id` can come back from several entries; the first one wins, which keeps
/// sort order. The required sets are read up front.
pub(crate) fn execute<'a, S: Store>(
    store: &'a S,
    ids: IdIter<'a>,
    required: &[Vec<ScanRange>],
) -> Result<IdIter<'a>, DbError> {
    let mut sets: Vec<HashSet<Vec<u8>>> = Vec::with_capacity(required.len());
    for scans in required {
        let mut set = HashSet::new();
        for scan in scans {
            for entry in store.range(&scan.range, ScanDirection::Forward)? {
                let (_, id) = entry?;
                set.insert(id);
            }
        }
        sets.push(set);
    }

    let mut seen = HashSet::new();
    Ok(Box::new(ids.filter(move |result| match result {
        Ok(id) => sets.iter().all(|set| set.contains(id)) && seen.insert(id.clone()),
        Err(_) => true,
    })))
}
