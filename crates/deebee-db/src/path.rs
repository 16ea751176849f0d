use bson::{Bson, Document};

/// Every value reachable through a dotted `path`.
///
/// A path segment that lands on an array of documents continues into each
/// element, so `a.b` on `{ a: [{ b: 1 }, { b: 2 }] }` yields `1` and `2`.
/// An empty result means the field is absent.
pub(crate) fn resolve<'a>(doc: &'a Document, path: &str) -> Vec<&'a Bson> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut out = Vec::new();
    walk_document(doc, &segments, &mut out);
    out
}

fn walk_document<'a>(doc: &'a Document, segments: &[&str], out: &mut Vec<&'a Bson>) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    if let Some(value) = doc.get(*head) {
        walk_value(value, rest, out);
    }
}

fn walk_value<'a>(value: &'a Bson, rest: &[&str], out: &mut Vec<&'a Bson>) {
    if rest.is_empty() {
        out.push(value);
        return;
    }
    match value {
        Bson::Document(doc) => walk_document(doc, rest, out),
        Bson::Array(items) => {
            for item in items {
                if let Bson::Document(doc) = item {
                    walk_document(doc, rest, out);
                }
            }
        }
        _ => {}
    }
}
