use bson::Bson;
use serde::{Deserialize, Serialize};

/// Bounds collected from `$gt`/`$gte`/`$lt`/`$lte` on one field.
///
/// When both the strict and inclusive form of a side are given, both are
/// kept; the matcher checks each and the planner uses the tighter one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeClause {
    pub gt: Option<Bson>,
    pub gte: Option<Bson>,
    pub lt: Option<Bson>,
    pub lte: Option<Bson>,
}

impl RangeClause {
    pub fn is_empty(&self) -> bool {
        self.gt.is_none() && self.gte.is_none() && self.lt.is_none() && self.lte.is_none()
    }

    /// Every operand carried by the clause.
    pub fn operands(&self) -> impl Iterator<Item = &Bson> {
        [&self.gt, &self.gte, &self.lt, &self.lte]
            .into_iter()
            .flatten()
    }
}

/// A single typed constraint on a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterClause {
    /// Implicit equality: `{ field: value }`.
    Eq(Bson),
    Range(RangeClause),
    In(Vec<Bson>),
    All(Vec<Bson>),
    Exists(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub clause: FilterClause,
}

/// Conjunction of field conditions, in the order they were written.
///
/// An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Conditions that constrain `field`.
    pub fn on<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FilterClause> + 'a {
        self.conditions
            .iter()
            .filter(move |c| c.field == field)
            .map(|c| &c.clause)
    }
}

