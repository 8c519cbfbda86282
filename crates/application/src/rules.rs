//! Parameter and query validation rules.
//!
//! A rule first decides whether it applies (`supports` and the
//! `should_validate_*` check), then validates. Applicability mismatches are
//! contract violations returned as [`AppError`]; invalid user input is
//! appended to [`ValidationErrors`] and reported as `Ok(false)`.

mod fieldset;
mod include;
mod parameter_names;
mod pn_filter;
mod scalar;

use mailapi_core::{AppError, AppResult};
use mailapi_domain::{Parameter, ResourceQuery};

use crate::validation::ValidationErrors;

pub(crate) use fieldset::WILDCARD;
pub use fieldset::{FieldsetRule, RelativeFieldsetRule};
pub use include::{IncludeRule, merge_includes};
pub use parameter_names::ParameterNamesInListQueryRule;
pub use pn_filter::{PnFilterRule, validate_polish_notation};
pub use scalar::{IntegerValueRule, JsonEncodedRule, ValuesInWhitelistRule};

/// Validation rule for one query parameter.
pub trait ParameterRule {
    /// Returns whether the rule can handle `parameter` at all.
    fn supports(&self, _parameter: &Parameter) -> bool {
        true
    }

    /// Returns whether this rule is responsible for `parameter`.
    fn should_validate_parameter(&self, parameter: &Parameter) -> bool;

    /// Validates `parameter`, appending to `errors` on failure.
    fn validate(&self, parameter: &Parameter, errors: &mut ValidationErrors) -> bool;

    /// Checks applicability and validates `parameter`.
    fn is_valid(&self, parameter: &Parameter, errors: &mut ValidationErrors) -> AppResult<bool> {
        if !self.supports(parameter) || !self.should_validate_parameter(parameter) {
            return Err(AppError::UnsupportedParameter(format!(
                "rule does not validate parameter '{}'",
                parameter.name()
            )));
        }

        Ok(self.validate(parameter, errors))
    }
}

/// Validation rule for a whole query.
pub trait QueryRule {
    /// Returns whether the rule can handle `query` at all.
    fn supports(&self, _query: &ResourceQuery<'_>) -> bool {
        true
    }

    /// Returns whether this rule is responsible for `query`.
    fn should_validate_query(&self, _query: &ResourceQuery<'_>) -> bool {
        true
    }

    /// Validates `query`, appending to `errors` on failure.
    fn validate(&self, query: &ResourceQuery<'_>, errors: &mut ValidationErrors) -> bool;

    /// Checks applicability and validates `query`.
    fn is_valid(
        &self,
        query: &ResourceQuery<'_>,
        errors: &mut ValidationErrors,
    ) -> AppResult<bool> {
        if !self.supports(query) || !self.should_validate_query(query) {
            return Err(AppError::UnsupportedQuery(format!(
                "rule does not validate queries for '{}'",
                query.resource_target().type_name()
            )));
        }

        Ok(self.validate(query, errors))
    }
}
