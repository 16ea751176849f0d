mod collection;
mod cursor;
mod database;
pub mod encoding;
mod error;
mod executor;
mod id;
mod index;
mod key;
mod matcher;
mod path;
mod planner;

pub use bson::{Bson, Document};
pub use collection::Collection;
pub use cursor::{Cursor, CursorIter};
pub use database::{Database, DatabaseConfig};
pub use deebee_query::{Filter, FilterParseError, Query, Sort, SortDirection};
pub use deebee_store::ScanDirection;
pub use encoding::EncodingError;
pub use error::DbError;
pub use index::IndexDefinition;
pub use planner::QueryPlan;
