//! Typed read access to a validated query for repositories.

use mailapi_core::{AppError, AppResult};
use mailapi_domain::{
    Expression, Parameter, ResourceDescription, ResourceQuery, SortField, fieldset_parameter_name,
};
use serde_json::Value;

use crate::rules::{WILDCARD, merge_includes};
use crate::validator::{
    FILTER_PARAMETER, INCLUDE_PARAMETER, PAGE_LIMIT_PARAMETER, PAGE_START_PARAMETER, SORT_PARAMETER,
};

/// Query view consumed by repositories.
pub trait RepositoryQuery {
    /// Returns the addressed resource description.
    fn resource_target(&self) -> &ResourceDescription;

    /// Returns the fields to load for `type_name`, which must be reachable
    /// from the target.
    fn fields(&self, type_name: &str) -> AppResult<Vec<String>>;

    /// Returns the deepest requested include paths.
    fn include(&self) -> Vec<String>;

    /// Returns the decoded filter expression, if any.
    fn filter(&self) -> AppResult<Option<Expression>>;

    /// Returns the requested sort order.
    fn sort(&self) -> AppResult<Vec<SortField>>;

    /// Returns the page offset, if any.
    fn start(&self) -> AppResult<Option<u64>>;

    /// Returns the page size, if any.
    fn limit(&self) -> AppResult<Option<u64>>;
}

/// [`RepositoryQuery`] over JSON:API query parameters.
///
/// Meant for queries that already passed validation; malformed values still
/// surface as [`AppError::Validation`] instead of being ignored.
#[derive(Debug, Clone, Copy)]
pub struct JsonApiRepositoryQuery<'q, 'g> {
    query: &'q ResourceQuery<'g>,
}

impl<'q, 'g> JsonApiRepositoryQuery<'q, 'g> {
    /// Wraps `query`.
    #[must_use]
    pub fn new(query: &'q ResourceQuery<'g>) -> Self {
        Self { query }
    }

    fn non_empty(&self, name: &str) -> Option<&'q str> {
        self.query
            .parameter(name)
            .and_then(Parameter::value)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn integer(&self, name: &str) -> AppResult<Option<u64>> {
        self.non_empty(name)
            .map(|value| {
                value.parse::<u64>().map_err(|error| {
                    AppError::Validation(format!("invalid {name} value '{value}': {error}"))
                })
            })
            .transpose()
    }
}

impl RepositoryQuery for JsonApiRepositoryQuery<'_, '_> {
    fn resource_target(&self) -> &ResourceDescription {
        self.query.resource_target()
    }

    fn fields(&self, type_name: &str) -> AppResult<Vec<String>> {
        let Some(description) = self.query.walker().find_by_type(type_name) else {
            return Err(AppError::NotFound(format!(
                "resource type '{type_name}' is not reachable from '{}'",
                self.query.resource_target().type_name()
            )));
        };

        if let Some(parameter) = self
            .query
            .parameter(&fieldset_parameter_name(type_name, false))
        {
            return Ok(absolute_fields(description, parameter));
        }

        if let Some(parameter) = self
            .query
            .parameter(&fieldset_parameter_name(type_name, true))
        {
            return Ok(relative_fields(description, parameter));
        }

        Ok(description.default_fields().to_vec())
    }

    fn include(&self) -> Vec<String> {
        let Some(include) = self.query.parameter(INCLUDE_PARAMETER) else {
            return Vec::new();
        };

        merge_includes(&include.list_value())
            .into_iter()
            .map(ToOwned::to_owned)
            .collect()
    }

    fn filter(&self) -> AppResult<Option<Expression>> {
        let Some(raw) = self.non_empty(FILTER_PARAMETER) else {
            return Ok(None);
        };

        let node = serde_json::from_str::<Value>(raw).map_err(|error| {
            AppError::Validation(format!(
                "\"{FILTER_PARAMETER}\" must be valid JSON: {error}"
            ))
        })?;

        Expression::from_polish_notation(&node).map(Some)
    }

    fn sort(&self) -> AppResult<Vec<SortField>> {
        self.query
            .parameter(SORT_PARAMETER)
            .map(Parameter::list_value)
            .unwrap_or_default()
            .into_iter()
            .map(str::parse::<SortField>)
            .collect()
    }

    fn start(&self) -> AppResult<Option<u64>> {
        self.integer(PAGE_START_PARAMETER)
    }

    fn limit(&self) -> AppResult<Option<u64>> {
        self.integer(PAGE_LIMIT_PARAMETER)
    }
}

fn absolute_fields(description: &ResourceDescription, parameter: &Parameter) -> Vec<String> {
    let requested = parameter.list_value();
    if requested.contains(&WILDCARD) {
        return description.fields().to_vec();
    }

    let mut fields: Vec<String> = Vec::with_capacity(requested.len());
    for field in requested {
        if !fields.iter().any(|known| known == field) {
            fields.push(field.to_owned());
        }
    }

    fields
}

fn relative_fields(description: &ResourceDescription, parameter: &Parameter) -> Vec<String> {
    let entries = parameter.list_value();
    let mut selected = if entries.contains(&WILDCARD) {
        description.fields().to_vec()
    } else {
        description.default_fields().to_vec()
    };

    for entry in entries {
        if let Some(field) = entry.strip_prefix('+') {
            if !selected.iter().any(|known| known == field) {
                selected.push(field.to_owned());
            }
        } else if let Some(field) = entry.strip_prefix('-') {
            selected.retain(|known| known != field);
        }
    }

    // declaration order
    description
        .fields()
        .iter()
        .filter(|field| selected.contains(field))
        .cloned()
        .collect()
}
