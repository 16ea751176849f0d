use bson::{Bson, Document};

use crate::filter::{Condition, Filter, FilterClause, RangeClause};
use crate::operator::Operator;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterParseError {
    #[error("unsupported operator {operator} on field {field:?}")]
    UnsupportedOperator { field: String, operator: String },
    #[error("invalid operand for {operator} on field {field:?}: {reason}")]
    InvalidOperand {
        field: String,
        operator: Operator,
        reason: &'static str,
    },
    #[error("field {0:?} mixes operators and plain keys")]
    MixedOperatorDocument(String),
}

/// Parse a filter document into a typed [`Filter`].
///
/// - The top-level document is an implicit AND of its entries.
/// - `{ "field": value }` is implicit equality.
/// - `{ "field": { "$gt": v, ... } }` uses an operator sub-document; the
///   range operators of one sub-document collapse into a single clause.
/// - A sub-document without `$` keys is an equality on an embedded document.
/// - Anything else starting with `$` is rejected.
pub fn parse_filter(doc: &Document) -> Result<Filter, FilterParseError> {
    let mut conditions = Vec::with_capacity(doc.len());

    for (field, value) in doc {
        if field.starts_with('$') {
            return Err(FilterParseError::UnsupportedOperator {
                field: String::new(),
                operator: field.clone(),
            });
        }
        match value {
            Bson::Document(sub) if is_operator_doc(field, sub)? => {
                parse_operator_doc(field, sub, &mut conditions)?;
            }
            other => conditions.push(Condition {
                field: field.clone(),
                clause: FilterClause::Eq(other.clone()),
            }),
        }
    }

    Ok(Filter::new(conditions))
}

fn is_operator_doc(field: &str, sub: &Document) -> Result<bool, FilterParseError> {
    let dollar = sub.keys().filter(|k| k.starts_with('$')).count();
    match dollar {
        0 => Ok(false),
        n if n == sub.len() => Ok(true),
        _ => Err(FilterParseError::MixedOperatorDocument(field.to_string())),
    }
}

fn parse_operator_doc(
    field: &str,
    sub: &Document,
    out: &mut Vec<Condition>,
) -> Result<(), FilterParseError> {
    let mut range = RangeClause::default();

    for (key, operand) in sub {
        let operator =
            Operator::parse(key).ok_or_else(|| FilterParseError::UnsupportedOperator {
                field: field.to_string(),
                operator: key.clone(),
            })?;

        let invalid = |reason| FilterParseError::InvalidOperand {
            field: field.to_string(),
            operator,
            reason,
        };

        if operator.is_range() && matches!(operand, Bson::Array(_)) {
            return Err(invalid("range operand must not be an array"));
        }

        let clause = match operator {
            Operator::Gt => {
                range.gt = Some(operand.clone());
                continue;
            }
            Operator::Gte => {
                range.gte = Some(operand.clone());
                continue;
            }
            Operator::Lt => {
                range.lt = Some(operand.clone());
                continue;
            }
            Operator::Lte => {
                range.lte = Some(operand.clone());
                continue;
            }
            Operator::In => match operand {
                Bson::Array(values) => FilterClause::In(values.clone()),
                _ => return Err(invalid("expected an array")),
            },
            Operator::All => match operand {
                Bson::Array(values) => FilterClause::All(values.clone()),
                _ => return Err(invalid("expected an array")),
            },
            Operator::Exists => match operand {
                Bson::Boolean(b) => FilterClause::Exists(*b),
                _ => return Err(invalid("expected a boolean")),
            },
        };
        out.push(Condition {
            field: field.to_string(),
            clause,
        });
    }

    if !range.is_empty() {
        out.push(Condition {
            field: field.to_string(),
            clause: FilterClause::Range(range),
        });
    }
    Ok(())
}
