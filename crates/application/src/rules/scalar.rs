use std::collections::BTreeSet;

use mailapi_domain::Parameter;
use serde_json::Value;

use crate::rules::ParameterRule;
use crate::validation::{ValidationError, ValidationErrors};

/// Requires parameter values to be JSON documents.
#[derive(Debug, Clone)]
pub struct JsonEncodedRule {
    names: BTreeSet<String>,
}

impl JsonEncodedRule {
    /// Creates the rule for the given parameter names.
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl ParameterRule for JsonEncodedRule {
    fn should_validate_parameter(&self, parameter: &Parameter) -> bool {
        self.names.contains(parameter.name())
    }

    fn validate(&self, parameter: &Parameter, errors: &mut ValidationErrors) -> bool {
        let raw = parameter.value().unwrap_or_default();
        match serde_json::from_str::<Value>(raw) {
            Ok(_) => true,
            Err(error) => {
                errors.push(ValidationError::bad_parameter(
                    parameter,
                    format!("\"{}\" must be valid JSON: {error}", parameter.name()),
                ));
                false
            }
        }
    }
}

/// Requires an integer value within an inclusive range.
#[derive(Debug, Clone)]
pub struct IntegerValueRule {
    name: String,
    min: u64,
    max: u64,
}

impl IntegerValueRule {
    /// Creates the rule for parameter `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, min: u64, max: u64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
        }
    }
}

impl ParameterRule for IntegerValueRule {
    fn should_validate_parameter(&self, parameter: &Parameter) -> bool {
        parameter.name() == self.name
    }

    fn validate(&self, parameter: &Parameter, errors: &mut ValidationErrors) -> bool {
        let in_range = parameter
            .value()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .is_some_and(|value| (self.min..=self.max).contains(&value));

        if !in_range {
            errors.push(ValidationError::bad_parameter(
                parameter,
                format!(
                    "\"{}\" must be an integer between {} and {}",
                    parameter.name(),
                    self.min,
                    self.max
                ),
            ));
        }

        in_range
    }
}

/// Requires every comma-separated value to be whitelisted.
#[derive(Debug, Clone)]
pub struct ValuesInWhitelistRule {
    name: String,
    whitelist: BTreeSet<String>,
    descending_prefix: bool,
}

impl ValuesInWhitelistRule {
    /// Creates the rule for parameter `name`.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, whitelist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            whitelist: whitelist.into_iter().map(Into::into).collect(),
            descending_prefix: false,
        }
    }

    /// Accepts values prefixed with `-`, as used by `sort`.
    #[must_use]
    pub fn allow_descending_prefix(mut self) -> Self {
        self.descending_prefix = true;
        self
    }
}

impl ParameterRule for ValuesInWhitelistRule {
    fn should_validate_parameter(&self, parameter: &Parameter) -> bool {
        parameter.name() == self.name
    }

    fn validate(&self, parameter: &Parameter, errors: &mut ValidationErrors) -> bool {
        let invalid = parameter
            .list_value()
            .into_iter()
            .filter(|value| {
                let value = match value.strip_prefix('-') {
                    Some(stripped) if self.descending_prefix => stripped,
                    _ => *value,
                };
                !self.whitelist.contains(value)
            })
            .collect::<Vec<_>>();

        if invalid.is_empty() {
            return true;
        }

        errors.push(ValidationError::bad_parameter(
            parameter,
            format!(
                "\"{}\" contains values that are not allowed: {}",
                parameter.name(),
                invalid.join(", ")
            ),
        ));
        false
    }
}
