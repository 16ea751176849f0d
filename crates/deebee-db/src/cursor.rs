use bson::Document;
use deebee_query::{Filter, Query, Sort, SortDirection};
use deebee_store::Store;

use crate::collection::Collection;
use crate::error::DbError;
use crate::executor::{DocIter, Executor};
use crate::index::IndexDefinition;
use crate::matcher::Matcher;
use crate::planner::{self, Plan, QueryPlan};

/// A deferred query over one collection.
///
/// Builders only record options. Every resolution (`iter`, `to_vec`,
/// `count`, `get_index`, `explain`) plans against the current index
/// catalog and reads the current store contents, so one cursor can be
/// resolved any number of times.
pub struct Cursor<S: Store> {
    collection: Collection<S>,
    query: Query,
}

impl<S: Store> std::fmt::Debug for Cursor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("collection", &self.collection.name())
            .field("query", &self.query)
            .finish()
    }
}

impl<S: Store> Cursor<S> {
    pub(crate) fn new(collection: Collection<S>, filter: Filter) -> Self {
        Self {
            collection,
            query: Query::new(filter),
        }
    }

    pub fn skip(mut self, n: usize) -> Self {
        self.query.skip = n;
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.query.limit = Some(n);
        self
    }

    /// Order results by `field`. Requires an index that can produce the
    /// order; resolution fails with [`DbError::SortWithoutIndex`] otherwise.
    pub fn sort(mut self, field: impl Into<String>, direction: impl Into<SortDirection>) -> Self {
        self.query.sort = Some(Sort::new(field, direction));
        self
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    fn plan(&self) -> Result<Plan, DbError> {
        let indexes = self.collection.list_indexes()?;
        planner::plan(self.collection.name(), &indexes, &self.query)
    }

    /// The index a resolution would read, or `None` for a full scan.
    pub fn get_index(&self) -> Result<Option<IndexDefinition>, DbError> {
        Ok(self.plan()?.index().cloned())
    }

    pub fn explain(&self) -> Result<QueryPlan, DbError> {
        Ok(self.plan()?.explain())
    }

    /// Plan the query and return a streaming iterator over the matches.
    pub fn iter(&self) -> Result<CursorIter<'_>, DbError> {
        let matcher = Matcher::new(&self.query.filter)?;
        let plan = self.plan()?;
        tracing::trace!(collection = self.collection.name(), plan = ?plan.explain(), "resolving cursor");
        let exec = Executor::new(self.collection.store(), self.collection.name());
        let inner = exec.execute(&plan, matcher, self.query.skip, self.query.limit)?;
        Ok(CursorIter { inner })
    }

    pub fn to_vec(&self) -> Result<Vec<Document>, DbError> {
        self.iter()?.collect()
    }

    /// Number of documents a resolution yields, after skip and limit.
    pub fn count(&self) -> Result<usize, DbError> {
        let mut n = 0;
        for doc in self.iter()? {
            doc?;
            n += 1;
        }
        Ok(n)
    }
}

impl<S: Store> Clone for Cursor<S> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            query: self.query.clone(),
        }
    }
}

impl<'a, S: Store> IntoIterator for &'a Cursor<S> {
    type Item = Result<Document, DbError>;
    type IntoIter = CursorIter<'a>;

    /// Resolution errors surface as the first item.
    fn into_iter(self) -> CursorIter<'a> {
        match self.iter() {
            Ok(iter) => iter,
            Err(e) => CursorIter {
                inner: Box::new(std::iter::once(Err(e))),
            },
        }
    }
}

/// A streaming iterator over query results.
pub struct CursorIter<'a> {
    inner: DocIter<'a>,
}

impl Iterator for CursorIter<'_> {
    type Item = Result<Document, DbError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}
