use std::cmp::Ordering;

use deebee_store::{KvIter, ScanDirection, Store};

use crate::error::DbError;
use crate::executor::IdIter;
use crate::planner::ScanRange;

/// `_id`s from a set of index ranges.
///
/// Without `merge` the ranges are read one after another. With `merge` they
/// are interleaved on each key's order bytes so the output follows the sort
/// across all ranges.
pub(crate) fn execute<'a, S: Store>(
    store: &'a S,
    scans: Vec<ScanRange>,
    direction: ScanDirection,
    merge: bool,
) -> Result<IdIter<'a>, DbError> {
    if merge {
        let mut heads = Vec::with_capacity(scans.len());
        for scan in scans {
            heads.push(Head {
                entries: store.range(&scan.range, direction)?,
                offset: scan.order_offset,
                current: None,
            });
        }
        return Ok(Box::new(MergeScan {
            heads,
            reverse: direction == ScanDirection::Reverse,
            primed: false,
            pending: None,
        }));
    }

    Ok(Box::new(scans.into_iter().flat_map(
        move |scan| -> IdIter<'a> {
            match store.range(&scan.range, direction) {
                Ok(entries) => Box::new(entries.map(|entry| -> Result<Vec<u8>, DbError> {
                    let (_, id) = entry?;
                    Ok(id)
                })),
                Err(e) => Box::new(std::iter::once(Err(e.into()))),
            }
        },
    )))
}

struct Head<'a> {
    entries: KvIter<'a>,
    offset: usize,
    /// `(order bytes, _id)` of the next entry.
    current: Option<(Vec<u8>, Vec<u8>)>,
}

impl Head<'_> {
    fn advance(&mut self) -> Result<(), DbError> {
        self.current = match self.entries.next() {
            None => None,
            Some(entry) => {
                let (key, id) = entry?;
                let order = key.get(self.offset..).unwrap_or_default().to_vec();
                Some((order, id))
            }
        };
        Ok(())
    }
}

struct MergeScan<'a> {
    heads: Vec<Head<'a>>,
    reverse: bool,
    primed: bool,
    pending: Option<DbError>,
}

impl MergeScan<'_> {
    fn prime(&mut self) -> Result<(), DbError> {
        self.primed = true;
        for head in &mut self.heads {
            head.advance()?;
        }
        Ok(())
    }

    /// Head whose next entry comes first in output order.
    fn pick(&self) -> Option<usize> {
        let mut best: Option<(usize, &[u8])> = None;
        for (i, head) in self.heads.iter().enumerate() {
            let Some((order, _)) = &head.current else {
                continue;
            };
            let wins = match best {
                None => true,
                Some((_, current)) => {
                    let ord = order.as_slice().cmp(current);
                    if self.reverse {
                        ord == Ordering::Greater
                    } else {
                        ord == Ordering::Less
                    }
                }
            };
            if wins {
                best = Some((i, order.as_slice()));
            }
        }
        best.map(|(i, _)| i)
    }
}

impl Iterator for MergeScan<'_> {
    type Item = Result<Vec<u8>, DbError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(e) = self.pending.take() {
            return Some(Err(e));
        }
        if !self.primed {
            if let Err(e) = self.prime() {
                return Some(Err(e));
            }
        }
        let i = self.pick()?;
        let head = &mut self.heads[i];
        let (_, id) = head.current.take()?;
        if let Err(e) = head.advance() {
            self.pending = Some(e);
        }
        Some(Ok(id))
    }
}
