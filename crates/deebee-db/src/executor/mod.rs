mod nodes;

use bson::Document;
use deebee_store::Store;

use crate::error::DbError;
use crate::matcher::Matcher;
use crate::planner::{Access, Plan};

/// Lazy stream of encoded `_id`s.
pub(crate) type IdIter<'a> = Box<dyn Iterator<Item = Result<Vec<u8>, DbError>> + 'a>;

/// Lazy stream of documents.
pub(crate) type DocIter<'a> = Box<dyn Iterator<Item = Result<Document, DbError>> + 'a>;

/// Turns a [`Plan`] into a document stream over one collection.
pub(crate) struct Executor<'a, S: Store> {
    store: &'a S,
    collection: &'a str,
}

impl<'a, S: Store> Executor<'a, S> {
    pub(crate) fn new(store: &'a S, collection: &'a str) -> Self {
        Self { store, collection }
    }

    /// Candidates → matcher → skip/limit. Nothing is read until the
    /// returned iterator is polled, except the `_id` sets of `$all`
    /// intersections.
    pub(crate) fn execute(
        &self,
        plan: &Plan,
        matcher: Matcher,
        skip: usize,
        limit: Option<usize>,
    ) -> Result<DocIter<'a>, DbError> {
        let candidates = match &plan.access {
            Access::FullScan => nodes::scan::execute(self.store, self.collection, plan.direction)?,
            Access::Index(access) => {
                let ids = nodes::index_scan::execute(
                    self.store,
                    access.scans.clone(),
                    plan.direction,
                    access.merge,
                )?;
                let ids = nodes::index_merge::execute(self.store, ids, &access.required)?;
                nodes::read_record::execute(self.store, self.collection, ids)
            }
        };
        let matched = nodes::filter::execute(matcher, candidates);
        Ok(nodes::limit::execute(skip, limit, matched))
    }
}
