use bson::Bson;
use deebee_query::{Filter, FilterClause, Query, RangeClause, Sort};
use deebee_store::{KeyRange, ScanDirection, increment_prefix};

use crate::encoding::{self, EncodingError, tag};
use crate::error::DbError;
use crate::index::IndexDefinition;
use crate::key::Key;

use super::plan::{Access, IndexAccess, Plan, ScanRange};

/// What the filter lets the planner do with one index position.
#[derive(Debug, Clone)]
enum Choice {
    /// Union of exact values.
    Points(Vec<Vec<u8>>),
    /// Every operand's points must hold for the same `_id`.
    AllOf(Vec<Vec<Vec<u8>>>),
    /// One contiguous byte range `[lower, upper)`. Ends the prefix.
    Bounds { lower: Vec<u8>, upper: Vec<u8> },
}

impl Choice {
    fn is_point(&self) -> bool {
        !matches!(self, Choice::Bounds { .. })
    }
}

#[derive(Debug, Clone)]
enum Segment {
    Points(Vec<Vec<u8>>),
    Bounds { lower: Vec<u8>, upper: Vec<u8> },
}

struct Candidate<'a> {
    index: &'a IndexDefinition,
    choices: Vec<Choice>,
    /// Position whose value the results are ordered by.
    order_at: Option<usize>,
}

/// Pick an access path for `query` over `indexes` (in definition order).
///
/// - An index is usable when a leading run of its fields is constrained by
///   equality, `$in`, `$all` or `$exists`, optionally followed by one range.
/// - With a sort, the sort field must sit right after that run; the run is
///   shortened if needed to get it there.
/// - The longest usable run wins; ties go to the index defined first.
/// - Without a sort an index that narrows nothing is never used.
pub(crate) fn plan(
    collection: &str,
    indexes: &[IndexDefinition],
    query: &Query,
) -> Result<Plan, DbError> {
    let sort = query.sort.as_ref();
    let direction = match sort {
        Some(sort) if sort.direction.is_desc() => ScanDirection::Reverse,
        _ => ScanDirection::Forward,
    };

    let mut best: Option<Candidate<'_>> = None;
    for index in indexes {
        let candidate = match sort {
            Some(sort) => sorted_candidate(index, &query.filter, sort)?,
            None => unsorted_candidate(index, &query.filter)?,
        };
        if let Some(candidate) = candidate {
            let better = best
                .as_ref()
                .is_none_or(|b| candidate.choices.len() > b.choices.len());
            if better {
                best = Some(candidate);
            }
        }
    }

    let Some(candidate) = best else {
        if let Some(sort) = sort {
            return Err(DbError::SortWithoutIndex {
                field: sort.field.clone(),
            });
        }
        tracing::debug!(collection, "planned full scan");
        return Ok(Plan {
            access: Access::FullScan,
            direction,
        });
    };

    let access = compile(collection, candidate, sort.is_some());
    tracing::debug!(
        collection,
        index = access.index.name(),
        fields = ?access.fields,
        ranges = access.scans.len(),
        intersections = access.required.len(),
        "planned index scan"
    );
    Ok(Plan {
        access: Access::Index(access),
        direction,
    })
}

fn unsorted_candidate<'a>(
    index: &'a IndexDefinition,
    filter: &Filter,
) -> Result<Option<Candidate<'a>>, EncodingError> {
    let mut choices = Vec::new();
    for field in index.fields() {
        let Some(choice) = choose(filter, field)? else {
            break;
        };
        let terminal = !choice.is_point();
        choices.push(choice);
        if terminal {
            break;
        }
    }
    if choices.is_empty() {
        return Ok(None);
    }
    Ok(Some(Candidate {
        index,
        choices,
        order_at: None,
    }))
}

fn sorted_candidate<'a>(
    index: &'a IndexDefinition,
    filter: &Filter,
    sort: &Sort,
) -> Result<Option<Candidate<'a>>, EncodingError> {
    let all = index
        .fields()
        .iter()
        .map(|field| choose(filter, field))
        .collect::<Result<Vec<_>, _>>()?;
    let points = all
        .iter()
        .take_while(|c| c.as_ref().is_some_and(Choice::is_point))
        .count();

    let Some(at) = (0..=points)
        .rev()
        .find(|&k| index.fields().get(k).is_some_and(|f| *f == sort.field))
    else {
        return Ok(None);
    };

    let mut remaining = all.into_iter();
    let mut choices: Vec<Choice> = remaining.by_ref().take(at).flatten().collect();
    if let Some(Some(choice)) = remaining.next() {
        choices.push(choice);
    }
    Ok(Some(Candidate {
        index,
        choices,
        order_at: Some(at),
    }))
}

/// Best usable constraint on `field`, if any.
fn choose(filter: &Filter, field: &str) -> Result<Option<Choice>, EncodingError> {
    let mut best: Option<(u8, Choice)> = None;
    for clause in filter.on(field) {
        let rank = rank(clause);
        if best.as_ref().is_some_and(|(r, _)| *r <= rank) {
            continue;
        }
        if let Some(choice) = choice_for(clause)? {
            best = Some((rank, choice));
        }
    }
    Ok(best.map(|(_, choice)| choice))
}

fn rank(clause: &FilterClause) -> u8 {
    match clause {
        FilterClause::Eq(_) => 0,
        FilterClause::In(_) => 1,
        FilterClause::All(_) => 2,
        FilterClause::Exists(false) => 3,
        FilterClause::Range(_) => 4,
        FilterClause::Exists(true) => 5,
    }
}

/// `None` when the clause can only be checked by the matcher.
fn choice_for(clause: &FilterClause) -> Result<Option<Choice>, EncodingError> {
    let choice = match clause {
        FilterClause::Eq(Bson::Array(_)) => return Ok(None),
        FilterClause::Eq(value) => Choice::Points(points(value)?),
        FilterClause::In(values) => {
            if values.iter().any(|v| matches!(v, Bson::Array(_))) {
                return Ok(None);
            }
            let mut all = Vec::new();
            for value in values {
                all.extend(points(value)?);
            }
            all.sort();
            all.dedup();
            Choice::Points(all)
        }
        FilterClause::All(values) => {
            if values.is_empty() || values.iter().any(|v| matches!(v, Bson::Array(_))) {
                return Ok(None);
            }
            let mut operands = values.iter().map(points).collect::<Result<Vec<_>, _>>()?;
            operands.dedup();
            Choice::AllOf(operands)
        }
        FilterClause::Exists(false) => Choice::Points(vec![encoding::ABSENT.to_vec()]),
        FilterClause::Exists(true) => Choice::Bounds {
            lower: vec![tag::ABSENT + 1],
            upper: ceiling(),
        },
        FilterClause::Range(range) => range_choice(range)?,
    };
    Ok(Some(choice))
}

/// Exact encodings matching `value` by equality. `null` also matches absent.
fn points(value: &Bson) -> Result<Vec<Vec<u8>>, EncodingError> {
    let encoded = encoding::encode(value)?;
    Ok(match value {
        Bson::Null => vec![encoding::ABSENT.to_vec(), encoded],
        _ => vec![encoded],
    })
}

fn ceiling() -> Vec<u8> {
    vec![tag::MAX + 1]
}

/// Byte range for a range clause, clipped to every operand's type bracket.
fn range_choice(range: &RangeClause) -> Result<Choice, EncodingError> {
    let mut lower = Vec::new();
    let mut upper = ceiling();
    for operand in range.operands() {
        let bracket = encoding::bracket(operand)?;
        lower = lower.max(bracket.lower());
        upper = upper.min(bracket.upper());
    }
    if let Some(value) = &range.gte {
        lower = lower.max(encoding::encode(value)?);
    }
    if let Some(value) = &range.gt {
        let after = increment_prefix(&encoding::encode(value)?).unwrap_or_else(ceiling);
        lower = lower.max(after);
    }
    if let Some(value) = &range.lte {
        let after = increment_prefix(&encoding::encode(value)?).unwrap_or_else(ceiling);
        upper = upper.min(after);
    }
    if let Some(value) = &range.lt {
        upper = upper.min(encoding::encode(value)?);
    }
    Ok(Choice::Bounds { lower, upper })
}

fn compile(collection: &str, candidate: Candidate<'_>, sorted: bool) -> IndexAccess {
    let base = Key::Index {
        collection,
        index: candidate.index.name(),
    }
    .encode();

    let driver: Vec<Segment> = candidate
        .choices
        .iter()
        .map(|choice| match choice {
            Choice::Points(points) => Segment::Points(points.clone()),
            Choice::AllOf(operands) => {
                Segment::Points(operands.first().cloned().unwrap_or_default())
            }
            Choice::Bounds { lower, upper } => Segment::Bounds {
                lower: lower.clone(),
                upper: upper.clone(),
            },
        })
        .collect();

    let mut required = Vec::new();
    for (position, choice) in candidate.choices.iter().enumerate() {
        if let Choice::AllOf(operands) = choice {
            for operand in operands.iter().skip(1) {
                let mut segments = driver.clone();
                segments[position] = Segment::Points(operand.clone());
                required.push(expand(&base, &segments, None));
            }
        }
    }

    let scans = expand(&base, &driver, candidate.order_at);
    IndexAccess {
        index: candidate.index.clone(),
        fields: candidate.index.fields()[..candidate.choices.len()].to_vec(),
        merge: sorted && scans.len() > 1,
        scans,
        required,
    }
}

/// Cartesian product of segments, as key ranges under `base`.
fn expand(base: &[u8], segments: &[Segment], order_at: Option<usize>) -> Vec<ScanRange> {
    let mut partial: Vec<(Vec<u8>, usize)> = vec![(base.to_vec(), base.len())];

    for (position, segment) in segments.iter().enumerate() {
        if order_at == Some(position) {
            mark_order(&mut partial);
        }
        match segment {
            Segment::Points(points) => {
                partial = partial
                    .iter()
                    .flat_map(|(prefix, offset)| {
                        points.iter().map(move |point| (concat(prefix, point), *offset))
                    })
                    .collect();
            }
            Segment::Bounds { lower, upper } => {
                return partial
                    .into_iter()
                    .map(|(prefix, order_offset)| ScanRange {
                        range: KeyRange::new(concat(&prefix, lower), concat(&prefix, upper)),
                        order_offset,
                    })
                    .collect();
            }
        }
    }

    if order_at == Some(segments.len()) {
        mark_order(&mut partial);
    }
    partial
        .into_iter()
        .map(|(prefix, order_offset)| ScanRange {
            range: KeyRange::prefix(&prefix),
            order_offset,
        })
        .collect()
}

fn mark_order(partial: &mut [(Vec<u8>, usize)]) {
    for (prefix, offset) in partial {
        *offset = prefix.len();
    }
}

fn concat(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{Document, doc};
    use deebee_query::{SortDirection, parse_filter};

    fn index(fields: &[&str]) -> IndexDefinition {
        IndexDefinition::new(fields.iter().copied()).unwrap()
    }

    fn query(filter: Document, sort: Option<(&str, SortDirection)>) -> Query {
        Query {
            filter: parse_filter(&filter).unwrap(),
            sort: sort.map(|(field, dir)| Sort::new(field, dir)),
            ..Default::default()
        }
    }

    fn chosen(indexes: &[IndexDefinition], q: &Query) -> Option<String> {
        plan("c", indexes, q)
            .unwrap()
            .index()
            .map(|i| i.name().to_string())
    }

    fn access(indexes: &[IndexDefinition], q: &Query) -> IndexAccess {
        match plan("c", indexes, q).unwrap().access {
            Access::Index(access) => access,
            Access::FullScan => panic!("expected an index scan"),
        }
    }

    #[test]
    fn no_indexes_means_full_scan() {
        let q = query(doc! { "a": 1 }, None);
        assert_eq!(chosen(&[], &q), None);
    }

    #[test]
    fn unconstrained_index_is_not_used_without_sort() {
        let q = query(doc! { "b": 1 }, None);
        assert_eq!(chosen(&[index(&["a"])], &q), None);
        let q = query(doc! {}, None);
        assert_eq!(chosen(&[index(&["a"])], &q), None);
    }

    #[test]
    fn suffix_only_constraint_is_not_usable() {
        let q = query(doc! { "example": { "$all": ["world"] } }, None);
        assert_eq!(chosen(&[index(&["index", "example"])], &q), None);
    }

    #[test]
    fn longest_prefix_wins() {
        let indexes = [index(&["color"]), index(&["color", "flavor"])];
        let q = query(doc! { "color": "red", "flavor": "good" }, None);
        assert_eq!(chosen(&indexes, &q).as_deref(), Some("color,flavor"));
    }

    #[test]
    fn ties_go_to_first_defined() {
        let indexes = [index(&["color", "x"]), index(&["color", "y"])];
        let q = query(doc! { "color": "red" }, None);
        assert_eq!(chosen(&indexes, &q).as_deref(), Some("color,x"));
    }

    #[test]
    fn range_ends_the_prefix() {
        let indexes = [index(&["a", "b"])];
        let q = query(doc! { "a": { "$gt": 1 }, "b": 2 }, None);
        assert_eq!(access(&indexes, &q).fields, vec!["a".to_string()]);
    }

    #[test]
    fn sort_requires_covering_index() {
        let q = query(doc! {}, Some(("notfound", SortDirection::Asc)));
        let err = plan("c", &[index(&["a"])], &q).unwrap_err();
        assert!(matches!(err, DbError::SortWithoutIndex { field } if field == "notfound"));
    }

    #[test]
    fn sort_field_must_follow_prefix() {
        let indexes = [index(&["color", "flavor"])];
        let q = query(doc! { "color": "red" }, Some(("flavor", SortDirection::Desc)));
        let plan = plan("c", &indexes, &q).unwrap();
        assert_eq!(plan.direction, ScanDirection::Reverse);
        assert_eq!(plan.index().map(|i| i.name()), Some("color,flavor"));

        let q = query(doc! {}, Some(("flavor", SortDirection::Asc)));
        assert!(super::plan("c", &indexes, &q).is_err());
    }

    #[test]
    fn sort_shortens_prefix_to_reach_sort_field() {
        let indexes = [index(&["a", "b"])];
        let q = query(doc! { "a": 1, "b": 2 }, Some(("b", SortDirection::Asc)));
        let access = access(&indexes, &q);
        assert_eq!(access.fields, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn range_and_sort_on_same_field() {
        let indexes = [index(&["example"])];
        let q = query(
            doc! { "example": { "$gte": 1, "$lte": 5 } },
            Some(("example", SortDirection::Asc)),
        );
        let access = access(&indexes, &q);
        assert_eq!(access.scans.len(), 1);
        assert!(!access.merge);
    }

    #[test]
    fn in_expands_to_one_range_per_value() {
        let indexes = [index(&["x"])];
        let q = query(doc! { "x": { "$in": [1, 3, 8, 3] } }, None);
        assert_eq!(access(&indexes, &q).scans.len(), 3);
    }

    #[test]
    fn in_under_sort_merges() {
        let indexes = [index(&["color", "flavor"])];
        let q = query(
            doc! { "color": { "$in": ["red", "purple"] } },
            Some(("flavor", SortDirection::Asc)),
        );
        let access = access(&indexes, &q);
        assert_eq!(access.scans.len(), 2);
        assert!(access.merge);
        // Ordering starts right after each scan's own `color` value.
        for scan in &access.scans {
            assert_eq!(scan.order_offset, scan.range.start.len());
        }
    }

    #[test]
    fn all_intersects_per_operand() {
        let indexes = [index(&["x"])];
        let q = query(doc! { "x": { "$all": [2, 6, 8] } }, None);
        let access = access(&indexes, &q);
        assert_eq!(access.scans.len(), 1);
        assert_eq!(access.required.len(), 2);
    }

    #[test]
    fn null_equality_scans_null_and_absent() {
        let indexes = [index(&["x"])];
        let q = query(doc! { "x": null }, None);
        assert_eq!(access(&indexes, &q).scans.len(), 2);
    }

    #[test]
    fn array_operands_fall_back_to_matcher() {
        let indexes = [index(&["x"])];
        assert_eq!(chosen(&indexes, &query(doc! { "x": [1, 2] }, None)), None);
        assert_eq!(
            chosen(&indexes, &query(doc! { "x": { "$in": [[1]] } }, None)),
            None
        );
        assert_eq!(
            chosen(&indexes, &query(doc! { "x": { "$all": [] } }, None)),
            None
        );
    }

    #[test]
    fn exists_uses_index() {
        let indexes = [index(&["example"])];
        let present = access(&indexes, &query(doc! { "example": { "$exists": true } }, None));
        let absent = access(&indexes, &query(doc! { "example": { "$exists": false } }, None));
        assert_eq!(present.scans.len(), 1);
        assert_eq!(absent.scans.len(), 1);
        assert!(absent.scans[0].range.end < present.scans[0].range.end);
    }

    #[test]
    fn range_is_clipped_to_operand_bracket() {
        let Choice::Bounds { lower, upper } =
            range_choice(&RangeClause {
                gt: Some(Bson::Int32(5)),
                ..Default::default()
            })
            .unwrap()
        else {
            panic!("expected bounds");
        };
        assert_eq!(upper, vec![tag::NUMBER + 1]);
        let six = encoding::encode(&Bson::Int32(6)).unwrap();
        let five = encoding::encode(&Bson::Int32(5)).unwrap();
        assert!(lower <= six && six < upper);
        assert!(five < lower);
    }

    #[test]
    fn mixed_bracket_range_is_empty() {
        let indexes = [index(&["x"])];
        let q = query(doc! { "x": { "$gte": 1, "$lt": "z" } }, None);
        let access = access(&indexes, &q);
        assert!(access.scans[0].range.is_empty());
    }
}
