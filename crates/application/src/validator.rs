//! Query validators composing rules per target resource.

use std::collections::BTreeSet;

use mailapi_core::{AppError, AppResult};
use mailapi_domain::{FIELDS_GROUP, RELFIELD_PREFIX, ResourceQuery, fieldset_parameter_name};
use tracing::{debug, warn};

use crate::config::QueryValidationConfig;
use crate::rules::{
    FieldsetRule, IncludeRule, IntegerValueRule, JsonEncodedRule, ParameterNamesInListQueryRule,
    ParameterRule, PnFilterRule, QueryRule, RelativeFieldsetRule, ValuesInWhitelistRule,
};
use crate::validation::ValidationErrors;

/// Parameter selecting related resources.
pub const INCLUDE_PARAMETER: &str = "include";
/// Parameter holding the JSON polish-notation filter.
pub const FILTER_PARAMETER: &str = "filter";
/// Parameter listing sort fields.
pub const SORT_PARAMETER: &str = "sort";
/// Parameter holding the page offset.
pub const PAGE_START_PARAMETER: &str = "page[start]";
/// Parameter holding the page size.
pub const PAGE_LIMIT_PARAMETER: &str = "page[limit]";

const RESERVED_PARAMETERS: [&str; 5] = [
    INCLUDE_PARAMETER,
    FILTER_PARAMETER,
    SORT_PARAMETER,
    PAGE_START_PARAMETER,
    PAGE_LIMIT_PARAMETER,
];

/// Returns whether `name` is a parameter with built-in validation, either a
/// collection parameter or an absolute or relative fieldset.
#[must_use]
pub fn is_reserved_parameter(name: &str) -> bool {
    RESERVED_PARAMETERS.contains(&name)
        || name
            .strip_prefix(RELFIELD_PREFIX)
            .unwrap_or(name)
            .strip_prefix(FIELDS_GROUP)
            .is_some_and(|rest| rest.starts_with('['))
}

/// Validates a query by running query rules and parameter rules over it.
pub trait QueryValidator {
    /// Returns whether this validator handles `query`.
    fn supports(&self, _query: &ResourceQuery<'_>) -> bool {
        true
    }

    /// Returns the query-level rules applying to `query`.
    fn query_rules<'g>(&self, query: &ResourceQuery<'g>) -> Vec<Box<dyn QueryRule + 'g>>;

    /// Returns the parameter-level rules applying to `query`.
    fn parameter_rules<'g>(&self, query: &ResourceQuery<'g>) -> Vec<Box<dyn ParameterRule + 'g>>;

    /// Runs every rule and appends each problem found to `errors`.
    ///
    /// Input problems never stop the pass. Only contract violations, such as
    /// an unsupported query, are returned as errors.
    fn validate(&self, query: &ResourceQuery<'_>, errors: &mut ValidationErrors) -> AppResult<()> {
        let resource = query.resource_target().type_name();
        if !self.supports(query) {
            warn!(resource, "validator invoked for unsupported query");
            return Err(AppError::UnsupportedQuery(format!(
                "validator does not handle queries for '{resource}'"
            )));
        }

        let query_rules = self.query_rules(query);
        let parameter_rules = self.parameter_rules(query);
        debug!(
            resource,
            parameters = query.all_parameters().len(),
            query_rules = query_rules.len(),
            parameter_rules = parameter_rules.len(),
            "validating query"
        );

        let errors_before = errors.len();
        for rule in &query_rules {
            rule.is_valid(query, errors)?;
        }

        for parameter in query.all_parameters() {
            for rule in &parameter_rules {
                if !rule.should_validate_parameter(parameter) {
                    continue;
                }

                if !rule.is_valid(parameter, errors)? {
                    debug!(resource, parameter = parameter.name(), "parameter rejected");
                }
            }
        }

        debug!(
            resource,
            errors = errors.len() - errors_before,
            "query validation finished"
        );
        Ok(())
    }

    /// Validates `query` into a fresh error collection.
    fn check(&self, query: &ResourceQuery<'_>) -> AppResult<ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.validate(query, &mut errors)?;
        Ok(errors)
    }
}

/// Returns the query target type plus every type named by an include path.
#[must_use]
pub fn included_types(query: &ResourceQuery<'_>) -> BTreeSet<String> {
    let mut types = BTreeSet::new();
    types.insert(query.resource_target().type_name().to_owned());

    if let Some(include) = query.parameter(INCLUDE_PARAMETER) {
        for path in include.list_value() {
            types.extend(path.split('.').map(ToOwned::to_owned));
        }
    }

    types
}

/// Validator for queries addressing a single resource.
///
/// Accepts `include` plus absolute and relative fieldsets for every type
/// reachable from the target.
#[derive(Debug, Clone, Default)]
pub struct ResourceQueryValidator {
    config: QueryValidationConfig,
}

impl ResourceQueryValidator {
    /// Creates the validator.
    #[must_use]
    pub fn new(config: QueryValidationConfig) -> Self {
        Self { config }
    }

    /// Returns every parameter name accepted for `query`.
    #[must_use]
    pub fn allowed_parameter_names(&self, query: &ResourceQuery<'_>) -> Vec<String> {
        let mut names = vec![INCLUDE_PARAMETER.to_owned()];
        for type_name in query.walker().all_relationship_types(true) {
            names.push(fieldset_parameter_name(type_name, false));
            names.push(fieldset_parameter_name(type_name, true));
        }

        names
    }
}

impl QueryValidator for ResourceQueryValidator {
    fn query_rules<'g>(&self, query: &ResourceQuery<'g>) -> Vec<Box<dyn QueryRule + 'g>> {
        vec![Box::new(ParameterNamesInListQueryRule::new(
            self.allowed_parameter_names(query),
        ))]
    }

    fn parameter_rules<'g>(&self, query: &ResourceQuery<'g>) -> Vec<Box<dyn ParameterRule + 'g>> {
        let walker = query.walker();
        let included = included_types(query);

        vec![
            Box::new(IncludeRule::new(walker.all_relationship_paths(false))),
            Box::new(FieldsetRule::new(
                walker,
                included.iter().cloned(),
                self.config.fieldset_wildcard,
            )),
            Box::new(RelativeFieldsetRule::new(
                walker,
                included,
                self.config.relative_fieldset_wildcard,
            )),
        ]
    }
}

/// Validator for queries listing a resource collection.
///
/// Adds pagination, sorting and filtering to [`ResourceQueryValidator`].
#[derive(Debug, Clone, Default)]
pub struct CollectionQueryValidator {
    resource: ResourceQueryValidator,
    config: QueryValidationConfig,
    filter_attributes: Option<Vec<String>>,
    json_parameters: Vec<String>,
}

impl CollectionQueryValidator {
    /// Creates the validator.
    #[must_use]
    pub fn new(config: QueryValidationConfig) -> Self {
        Self {
            resource: ResourceQueryValidator::new(config),
            config,
            filter_attributes: None,
            json_parameters: Vec::new(),
        }
    }

    /// Restricts filter attributes to `attributes` instead of the target's
    /// fields.
    #[must_use]
    pub fn filter_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter_attributes = Some(attributes.into_iter().map(Into::into).collect());
        self
    }

    /// Accepts additional parameters whose values must be JSON documents.
    ///
    /// Reserved names keep their own rules and are skipped here.
    #[must_use]
    pub fn json_parameters<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.json_parameters = names
            .into_iter()
            .map(Into::into)
            .filter(|name: &String| {
                let reserved = is_reserved_parameter(name);
                if reserved {
                    debug!(parameter = %name, "reserved name ignored as json parameter");
                }
                !reserved
            })
            .collect();
        self
    }

    /// Returns every parameter name accepted for `query`.
    #[must_use]
    pub fn allowed_parameter_names(&self, query: &ResourceQuery<'_>) -> Vec<String> {
        let mut names = self.resource.allowed_parameter_names(query);
        names.extend(
            [
                PAGE_START_PARAMETER,
                PAGE_LIMIT_PARAMETER,
                SORT_PARAMETER,
                FILTER_PARAMETER,
            ]
            .map(ToOwned::to_owned),
        );
        names.extend(self.json_parameters.iter().cloned());
        names
    }

    fn attributes(&self, query: &ResourceQuery<'_>) -> Vec<String> {
        self.filter_attributes
            .clone()
            .unwrap_or_else(|| query.resource_target().fields().to_vec())
    }
}

impl QueryValidator for CollectionQueryValidator {
    fn query_rules<'g>(&self, query: &ResourceQuery<'g>) -> Vec<Box<dyn QueryRule + 'g>> {
        vec![Box::new(ParameterNamesInListQueryRule::new(
            self.allowed_parameter_names(query),
        ))]
    }

    fn parameter_rules<'g>(&self, query: &ResourceQuery<'g>) -> Vec<Box<dyn ParameterRule + 'g>> {
        let mut rules = self.resource.parameter_rules(query);
        rules.push(Box::new(IntegerValueRule::new(
            PAGE_START_PARAMETER,
            0,
            u64::MAX,
        )));
        rules.push(Box::new(IntegerValueRule::new(
            PAGE_LIMIT_PARAMETER,
            1,
            self.config.max_page_limit,
        )));
        rules.push(Box::new(
            ValuesInWhitelistRule::new(SORT_PARAMETER, query.resource_target().fields().to_vec())
                .allow_descending_prefix(),
        ));
        rules.push(Box::new(PnFilterRule::new(
            FILTER_PARAMETER,
            self.attributes(query),
        )));

        if !self.json_parameters.is_empty() {
            rules.push(Box::new(JsonEncodedRule::new(self.json_parameters.clone())));
        }

        rules
    }
}

#[cfg(test)]
mod tests;
