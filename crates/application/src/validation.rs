use mailapi_core::TypedList;
use mailapi_domain::{Parameter, ResourceQuery};
use serde::Serialize;

/// HTTP status reported for client input problems.
pub const BAD_REQUEST: u16 = 400;

/// What a validation error was raised for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationSource {
    /// A single query parameter.
    Parameter {
        /// Offending parameter.
        parameter: Parameter,
    },
    /// The query as a whole.
    Query {
        /// Type of the resource the query addressed.
        target: String,
    },
}

impl ValidationSource {
    /// Creates a source pointing at `query`.
    #[must_use]
    pub fn query(query: &ResourceQuery<'_>) -> Self {
        Self::Query {
            target: query.resource_target().type_name().to_owned(),
        }
    }
}

impl From<&Parameter> for ValidationSource {
    fn from(parameter: &Parameter) -> Self {
        Self::Parameter {
            parameter: parameter.clone(),
        }
    }
}

/// One user-input problem found while validating a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    source: ValidationSource,
    details: String,
    code: u16,
}

impl ValidationError {
    /// Creates a validation error.
    #[must_use]
    pub fn new(source: ValidationSource, details: impl Into<String>, code: u16) -> Self {
        Self {
            source,
            details: details.into(),
            code,
        }
    }

    /// Creates a `400` error for `parameter`.
    #[must_use]
    pub fn bad_parameter(parameter: &Parameter, details: impl Into<String>) -> Self {
        Self::new(parameter.into(), details, BAD_REQUEST)
    }

    /// Creates a `400` error for `query`.
    #[must_use]
    pub fn bad_query(query: &ResourceQuery<'_>, details: impl Into<String>) -> Self {
        Self::new(ValidationSource::query(query), details, BAD_REQUEST)
    }

    /// Returns the failing parameter or query.
    #[must_use]
    pub fn source(&self) -> &ValidationSource {
        &self.source
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn details(&self) -> &str {
        self.details.as_str()
    }

    /// Returns the HTTP-style status code.
    #[must_use]
    pub fn code(&self) -> u16 {
        self.code
    }
}

/// Errors accumulated over one validation pass.
///
/// Create a fresh instance per request; rules only ever append.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: TypedList<ValidationError>,
}

impl ValidationErrors {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an error.
    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Returns whether any error was recorded.
    #[must_use]
    pub fn has_error(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns the number of recorded errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns whether no error was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterates errors in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// Returns the details of every error.
    #[must_use]
    pub fn details(&self) -> Vec<&str> {
        self.errors.map(ValidationError::details)
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.errors.iter())
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
