use std::collections::VecDeque;
use std::ops::Bound;
use std::sync::Arc;

use crate::store::{KeyRange, ScanDirection};

use super::store::Tree;

/// Lazy range iterator over a pinned tree snapshot.
///
/// Pulls `chunk` entries at a time and narrows its bounds past the last
/// key it has seen, so a caller that stops early never copies the rest.
pub(crate) struct SnapshotRange {
    tree: Arc<Tree>,
    lower: Bound<Vec<u8>>,
    upper: Bound<Vec<u8>>,
    direction: ScanDirection,
    chunk: usize,
    buffer: VecDeque<(Vec<u8>, Vec<u8>)>,
    exhausted: bool,
}

impl SnapshotRange {
    pub(crate) fn new(
        tree: Arc<Tree>,
        range: &KeyRange,
        direction: ScanDirection,
        chunk: usize,
    ) -> Self {
        let upper = match &range.end {
            Some(end) => Bound::Excluded(end.clone()),
            None => Bound::Unbounded,
        };
        Self {
            tree,
            lower: Bound::Included(range.start.clone()),
            upper,
            direction,
            chunk,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    fn bounds_valid(&self) -> bool {
        let (lo, lo_inclusive) = match &self.lower {
            Bound::Included(k) => (k, true),
            Bound::Excluded(k) => (k, false),
            Bound::Unbounded => return true,
        };
        let (hi, hi_inclusive) = match &self.upper {
            Bound::Included(k) => (k, true),
            Bound::Excluded(k) => (k, false),
            Bound::Unbounded => return true,
        };
        lo < hi || (lo == hi && lo_inclusive && hi_inclusive)
    }

    fn refill(&mut self) {
        if !self.bounds_valid() {
            self.exhausted = true;
            return;
        }
        let bounds = (self.lower.clone(), self.upper.clone());
        let entries = self.tree.range(bounds);
        let taken: Vec<(Vec<u8>, Vec<u8>)> = match self.direction {
            ScanDirection::Forward => entries
                .take(self.chunk)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            ScanDirection::Reverse => entries
                .rev()
                .take(self.chunk)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };

        if taken.len() < self.chunk {
            self.exhausted = true;
        }
        if let Some((last, _)) = taken.last() {
            match self.direction {
                ScanDirection::Forward => self.lower = Bound::Excluded(last.clone()),
                ScanDirection::Reverse => self.upper = Bound::Excluded(last.clone()),
            }
        }
        self.buffer.extend(taken);
    }
}

impl Iterator for SnapshotRange {
    type Item = (Vec<u8>, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            self.refill();
        }
        self.buffer.pop_front()
    }
}
