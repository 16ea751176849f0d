use crate::executor::DocIter;
use crate::matcher::Matcher;

/// Drop documents the matcher rejects. Errors pass through.
pub(crate) fn execute<'a>(matcher: Matcher, source: DocIter<'a>) -> DocIter<'a> {
    Box::new(source.filter(move |result| match result {
        Ok(doc) => matcher.matches(doc),
        Err(_) => true,
    }))
}
