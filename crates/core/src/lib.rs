//! Shared primitives for the mail API crates.

#![forbid(unsafe_code)]

/// Ordered, element-typed collections.
pub mod list;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use list::TypedList;

/// Result type used across mail API crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
///
/// These describe misuse of an API or invalid static configuration. Problems
/// with client supplied query input are reported as validation records by the
/// application crate instead.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Offset is outside of the addressable range of a list.
    #[error("offset {offset} is out of bounds for length {len}")]
    OutOfBounds {
        /// Requested offset.
        offset: usize,
        /// Length of the list at the time of the request.
        len: usize,
    },

    /// A parameter rule was invoked for a parameter it does not handle.
    #[error("unsupported parameter: {0}")]
    UnsupportedParameter(String),

    /// A query rule or validator was invoked for a query it does not handle.
    #[error("unsupported query: {0}")]
    UnsupportedQuery(String),

    /// Requested operation is not supported.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
