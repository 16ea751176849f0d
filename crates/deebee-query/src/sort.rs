use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn is_desc(&self) -> bool {
        matches!(self, SortDirection::Desc)
    }
}

/// `1` / `-1` style directions: negative means descending.
impl From<i32> for SortDirection {
    fn from(sign: i32) -> Self {
        if sign < 0 {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: impl Into<String>, direction: impl Into<SortDirection>) -> Self {
        Self {
            field: field.into(),
            direction: direction.into(),
        }
    }
}
