use deebee_store::{KeyRange, ScanDirection};

use crate::index::IndexDefinition;

/// How a query will read the collection, as reported by `Cursor::explain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    /// The index driving the scan; `None` means a full primary scan.
    pub index: Option<IndexDefinition>,
    /// Index fields narrowed by the filter, in index order.
    pub fields: Vec<String>,
    pub direction: ScanDirection,
    /// Key ranges scanned and unioned.
    pub scan_ranges: usize,
    /// Extra range sets whose `_id`s every result must also appear in.
    pub intersections: usize,
}

#[derive(Debug, Clone)]
pub(crate) enum Access {
    FullScan,
    Index(IndexAccess),
}

#[derive(Debug, Clone)]
pub(crate) struct IndexAccess {
    pub(crate) index: IndexDefinition,
    pub(crate) fields: Vec<String>,
    pub(crate) scans: Vec<ScanRange>,
    pub(crate) required: Vec<Vec<ScanRange>>,
    /// Scans must be merged on their order keys to keep sort order.
    pub(crate) merge: bool,
}

/// One contiguous slice of an index.
///
/// Bytes of a key from `order_offset` on compare in result order across all
/// scans of the same plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScanRange {
    pub(crate) range: KeyRange,
    pub(crate) order_offset: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct Plan {
    pub(crate) access: Access,
    pub(crate) direction: ScanDirection,
}

impl Plan {
    pub(crate) fn index(&self) -> Option<&IndexDefinition> {
        match &self.access {
            Access::FullScan => None,
            Access::Index(access) => Some(&access.index),
        }
    }

    pub(crate) fn explain(&self) -> QueryPlan {
        match &self.access {
            Access::FullScan => QueryPlan {
                index: None,
                fields: Vec::new(),
                direction: self.direction,
                scan_ranges: 1,
                intersections: 0,
            },
            Access::Index(access) => QueryPlan {
                index: Some(access.index.clone()),
                fields: access.fields.clone(),
                direction: self.direction,
                scan_ranges: access.scans.len(),
                intersections: access.required.len(),
            },
        }
    }
}
