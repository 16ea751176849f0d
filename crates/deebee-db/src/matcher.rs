//! Filter evaluation against a single document.
//!
//! Operands are encoded once when the matcher is built; field values are
//! compared through the same order-preserving encoding the indexes use, so a
//! document matches here exactly when an index scan would produce it.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use bson::{Bson, Document};
use deebee_query::{Filter, FilterClause, RangeClause};

use crate::encoding::{self, Bracket, EncodingError};
use crate::path;

#[derive(Debug, Clone)]
pub(crate) struct Matcher {
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone)]
struct Predicate {
    path: String,
    test: Test,
}

#[derive(Debug, Clone)]
enum Test {
    Eq(Operand),
    Range(Vec<(Ordering, bool, Vec<u8>)>),
    In(Vec<Operand>),
    All(Vec<Operand>),
    Exists(bool),
}

/// An encoded operand. `null` also matches a missing field.
#[derive(Debug, Clone)]
struct Operand {
    encoded: Vec<u8>,
    null: bool,
}

impl Operand {
    fn new(value: &Bson) -> Result<Self, EncodingError> {
        Ok(Self {
            encoded: encoding::encode(value)?,
            null: matches!(value, Bson::Null),
        })
    }

    fn found_in(&self, field: &FieldValues) -> bool {
        (self.null && field.absent) || field.candidates.contains(&self.encoded)
    }
}

/// Encoded views of one field of one document.
struct FieldValues {
    absent: bool,
    /// Each value, plus each element of array values.
    candidates: BTreeSet<Vec<u8>>,
}

impl FieldValues {
    fn of(doc: &Document, field: &str) -> Self {
        let values = path::resolve(doc, field);
        let mut candidates = BTreeSet::new();
        for value in &values {
            if let Bson::Array(items) = value {
                // Unencodable values can never equal an operand.
                candidates.extend(items.iter().filter_map(|v| encoding::encode(v).ok()));
            }
            if let Ok(encoded) = encoding::encode(value) {
                candidates.insert(encoded);
            }
        }
        Self {
            absent: values.is_empty(),
            candidates,
        }
    }
}

impl Matcher {
    pub(crate) fn new(filter: &Filter) -> Result<Self, EncodingError> {
        let predicates = filter
            .conditions()
            .iter()
            .map(|condition| {
                Ok(Predicate {
                    path: condition.field.clone(),
                    test: Test::new(&condition.clause)?,
                })
            })
            .collect::<Result<_, EncodingError>>()?;
        Ok(Self { predicates })
    }

    pub(crate) fn matches(&self, doc: &Document) -> bool {
        self.predicates.iter().all(|p| p.test.eval(doc, &p.path))
    }
}

impl Test {
    fn new(clause: &FilterClause) -> Result<Self, EncodingError> {
        Ok(match clause {
            FilterClause::Eq(value) => Test::Eq(Operand::new(value)?),
            FilterClause::Range(range) => Test::Range(range_bounds(range)?),
            FilterClause::In(values) => Test::In(operands(values)?),
            FilterClause::All(values) => Test::All(operands(values)?),
            FilterClause::Exists(expected) => Test::Exists(*expected),
        })
    }

    fn eval(&self, doc: &Document, field: &str) -> bool {
        if let Test::Exists(expected) = self {
            return path::resolve(doc, field).is_empty() != *expected;
        }
        let values = FieldValues::of(doc, field);
        match self {
            Test::Eq(operand) => operand.found_in(&values),
            Test::In(operands) => operands.iter().any(|o| o.found_in(&values)),
            Test::All(operands) => {
                !operands.is_empty() && operands.iter().all(|o| o.found_in(&values))
            }
            // One value has to satisfy every bound.
            Test::Range(bounds) => values.candidates.iter().any(|candidate| {
                bounds.iter().all(|(side, inclusive, operand)| {
                    if !Bracket::of(operand).contains(candidate) {
                        return false;
                    }
                    let ord = candidate.as_slice().cmp(operand.as_slice());
                    ord == *side || (*inclusive && ord == Ordering::Equal)
                })
            }),
            Test::Exists(_) => false,
        }
    }
}

fn operands(values: &[Bson]) -> Result<Vec<Operand>, EncodingError> {
    values.iter().map(Operand::new).collect()
}

/// `(required ordering of value vs operand, inclusive, operand)` per bound.
fn range_bounds(range: &RangeClause) -> Result<Vec<(Ordering, bool, Vec<u8>)>, EncodingError> {
    let sides = [
        (&range.gt, Ordering::Greater, false),
        (&range.gte, Ordering::Greater, true),
        (&range.lt, Ordering::Less, false),
        (&range.lte, Ordering::Less, true),
    ];
    let mut bounds = Vec::new();
    for (operand, side, inclusive) in sides {
        if let Some(value) = operand {
            bounds.push((side, inclusive, encoding::encode(value)?));
        }
    }
    Ok(bounds)
}
