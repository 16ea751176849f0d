use serde::{Deserialize, Serialize};

use crate::filter::Filter;
use crate::sort::Sort;

/// A deferred read: what to match, in which order, and which slice to return.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub filter: Filter,
    pub sort: Option<Sort>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }
}
