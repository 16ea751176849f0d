mod filter;
mod operator;
mod parse_filter;
mod query;
mod sort;

pub use filter::{Condition, Filter, FilterClause, RangeClause};
pub use operator::Operator;
pub use parse_filter::{FilterParseError, parse_filter};
pub use query::Query;
pub use sort::{Sort, SortDirection};
