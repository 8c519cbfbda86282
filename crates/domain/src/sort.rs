use std::str::FromStr;

use mailapi_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Sort direction of one sort field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Returns stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One entry of a `sort` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    field: NonEmptyString,
    direction: SortDirection,
}

impl SortField {
    /// Creates a validated sort field.
    pub fn new(field: impl Into<String>, direction: SortDirection) -> AppResult<Self> {
        Ok(Self {
            field: NonEmptyString::new(field)?,
            direction,
        })
    }

    /// Returns the sorted field.
    #[must_use]
    pub fn field(&self) -> &str {
        self.field.as_str()
    }

    /// Returns the direction.
    #[must_use]
    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

impl FromStr for SortField {
    type Err = AppError;

    /// Parses `field` (ascending) or `-field` (descending).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        match value.strip_prefix('-') {
            Some(field) => Self::new(field, SortDirection::Desc),
            None => Self::new(value, SortDirection::Asc),
        }
    }
}
