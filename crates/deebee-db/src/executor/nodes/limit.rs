use bson::Document;

use crate::error::DbError;
use crate::executor::DocIter;

/// Skip + take over matched documents.
///
/// Errors are never counted or skipped, and once `take` documents have been
/// produced the source is not polled again.
pub(crate) fn execute<'a>(skip: usize, take: Option<usize>, source: DocIter<'a>) -> DocIter<'a> {
    if skip == 0 && take.is_none() {
        return source;
    }
    Box::new(Page {
        source,
        skip,
        remaining: take,
    })
}

struct Page<'a> {
    source: DocIter<'a>,
    skip: usize,
    remaining: Option<usize>,
}

impl Iterator for Page<'_> {
    type Item = Result<Document, DbError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.remaining == Some(0) {
                return None;
            }
            let item = self.source.next()?;
            if item.is_ok() {
                if self.skip > 0 {
                    self.skip -= 1;
                    continue;
                }
                if let Some(remaining) = &mut self.remaining {
                    *remaining -= 1;
                }
            }
            return Some(item);
        }
    }
}
