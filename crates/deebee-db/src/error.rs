use bson::Bson;
use deebee_query::FilterParseError;
use deebee_store::StoreError;

use crate::encoding::EncodingError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("unsupported operator {operator} on field {field:?}")]
    UnsupportedOperator { field: String, operator: String },
    #[error("invalid filter: {0}")]
    InvalidFilter(FilterParseError),
    #[error("cannot sort by {field:?}: no index covers it")]
    SortWithoutIndex { field: String },
    #[error("invalid index fields: {0}")]
    InvalidIndexFields(String),
    #[error("index {name:?} already exists with different fields")]
    IndexConflict { name: String },
    #[error("invalid collection name {0:?}")]
    InvalidCollectionName(String),
    #[error("invalid _id: {0}")]
    InvalidId(String),
    #[error("duplicate _id {0}")]
    DuplicateId(Bson),
    #[error("write gate for collection {0:?} poisoned")]
    GatePoisoned(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),
}

impl From<FilterParseError> for DbError {
    fn from(e: FilterParseError) -> Self {
        match e {
            FilterParseError::UnsupportedOperator { field, operator } => {
                DbError::UnsupportedOperator { field, operator }
            }
            other => DbError::InvalidFilter(other),
        }
    }
}

impl From<bson::error::Error> for DbError {
    fn from(e: bson::error::Error) -> Self {
        DbError::Encoding(EncodingError::Bson(e))
    }
}
