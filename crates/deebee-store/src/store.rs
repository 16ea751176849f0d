use crate::batch::Batch;
use crate::error::StoreError;

/// Lazy sequence of `(key, value)` pairs produced by a range scan.
pub type KvIter<'a> = Box<dyn Iterator<Item = Result<(Vec<u8>, Vec<u8>), StoreError>> + 'a>;

/// Scan direction for range reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanDirection {
    #[default]
    Forward,
    Reverse,
}

/// Half-open byte range `[start, end)`. `end = None` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    pub start: Vec<u8>,
    pub end: Option<Vec<u8>>,
}

impl KeyRange {
    pub fn new(start: Vec<u8>, end: Vec<u8>) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// Every key that starts with `prefix`.
    pub fn prefix(prefix: &[u8]) -> Self {
        Self {
            start: prefix.to_vec(),
            end: increment_prefix(prefix),
        }
    }

    /// True when no key can fall inside the range.
    pub fn is_empty(&self) -> bool {
        matches!(&self.end, Some(end) if *end <= self.start)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        key >= self.start.as_slice() && self.end.as_deref().is_none_or(|end| key < end)
    }
}

/// Smallest byte string greater than every string prefixed by `prefix`.
///
/// Returns `None` when `prefix` is empty or all `0xFF` (no upper bound).
pub fn increment_prefix(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    while let Some(last) = upper.last_mut() {
        if *last < 0xFF {
            *last += 1;
            return Some(upper);
        }
        upper.pop();
    }
    None
}

/// An ordered key/value store.
///
/// Keys are compared byte-wise. Writes only happen through [`Batch`]es,
/// which must be applied atomically: after `write` returns either every
/// operation is visible or none is. Each `range` call reads a consistent
/// snapshot and may be restarted by calling it again.
pub trait Store: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn write(&self, batch: Batch) -> Result<(), StoreError>;

    fn range(&self, range: &KeyRange, direction: ScanDirection) -> Result<KvIter<'_>, StoreError>;

    fn scan_prefix(&self, prefix: &[u8], direction: ScanDirection) -> Result<KvIter<'_>, StoreError> {
        self.range(&KeyRange::prefix(prefix), direction)
    }
}

impl<S: Store + ?Sized> Store for std::sync::Arc<S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn write(&self, batch: Batch) -> Result<(), StoreError> {
        (**self).write(batch)
    }

    fn range(&self, range: &KeyRange, direction: ScanDirection) -> Result<KvIter<'_>, StoreError> {
        (**self).range(range, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_prefix_bumps_last_byte() {
        assert_eq!(increment_prefix(b"ab"), Some(b"ac".to_vec()));
    }

    #[test]
    fn increment_prefix_carries_over_ff() {
        assert_eq!(increment_prefix(&[0x01, 0xFF]), Some(vec![0x02]));
        assert_eq!(increment_prefix(&[0xFF, 0xFF]), None);
        assert_eq!(increment_prefix(b""), None);
    }

    #[test]
    fn prefix_range_contains_only_prefixed_keys() {
        let range = KeyRange::prefix(b"users\x00");
        assert!(range.contains(b"users\x00"));
        assert!(range.contains(b"users\x00\xFF\xFF"));
        assert!(!range.contains(b"users\x01"));
        assert!(!range.contains(b"user"));
    }

    #[test]
    fn inverted_range_is_empty() {
        assert!(KeyRange::new(b"b".to_vec(), b"a".to_vec()).is_empty());
        assert!(KeyRange::new(b"a".to_vec(), b"a".to_vec()).is_empty());
        assert!(!KeyRange::new(b"a".to_vec(), b"b".to_vec()).is_empty());
    }
}
