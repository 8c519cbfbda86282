use mailapi_domain::{Operator, Parameter};
use serde_json::{Map, Value};
use tracing::debug;

use crate::rules::ParameterRule;
use crate::validation::{ValidationError, ValidationErrors};

/// Checks a decoded polish-notation filter tree.
///
/// Every operator must be known and AND/OR need at least two operands.
/// Every attribute of a relational or functional leaf must appear in
/// `attributes`, and functional leaves take a non-empty array of values per
/// attribute. Anything accepted here decodes with
/// [`mailapi_domain::Expression::from_polish_notation`]. The first problem
/// found is returned.
pub fn validate_polish_notation(node: &Value, attributes: &[String]) -> Result<(), String> {
    let Some((token, operand)) = node
        .as_object()
        .filter(|object| object.len() == 1)
        .and_then(|object| object.iter().next())
    else {
        return Err("filter node must be an object with exactly one operator".to_owned());
    };

    match token.parse::<Operator>() {
        Ok(Operator::Logical(operator)) if operator.is_variadic() => {
            let Some(operands) = operand.as_array() else {
                return Err(format!(
                    "Logical operator \"{token}\" expects an array of operands"
                ));
            };

            if operands.len() < 2 {
                return Err(format!(
                    "Logical operator \"{token}\" expects at least 2 operands, {} given",
                    operands.len()
                ));
            }

            operands
                .iter()
                .try_for_each(|operand| validate_polish_notation(operand, attributes))
        }
        Ok(Operator::Relational(_)) => leaf_arguments(token, operand, attributes).map(|_| ()),
        Ok(Operator::Functional(operator)) => {
            for (attribute, values) in leaf_arguments(token, operand, attributes)? {
                match values.as_array() {
                    Some(values) if values.is_empty() => {
                        return Err(format!(
                            "\"{}\" on \"{attribute}\" expects at least one value",
                            operator.as_str()
                        ));
                    }
                    Some(_) => {}
                    None => {
                        return Err(format!(
                            "\"{token}\" expects an array of values for \"{attribute}\""
                        ));
                    }
                }
            }

            Ok(())
        }
        _ => Err(format!("\"{token}\" is not a valid operator")),
    }
}

fn leaf_arguments<'a>(
    token: &str,
    operand: &'a Value,
    attributes: &[String],
) -> Result<&'a Map<String, Value>, String> {
    let Some(arguments) = operand.as_object() else {
        return Err(format!("\"{token}\" expects an object argument"));
    };

    let invalid = arguments
        .keys()
        .filter(|attribute| !attributes.contains(attribute))
        .map(String::as_str)
        .collect::<Vec<_>>();

    if arguments.is_empty() || !invalid.is_empty() {
        return Err(format!(
            "\"{token}\" needs a valid attribute argument, received \"{}\"",
            invalid.join(", ")
        ));
    }

    Ok(arguments)
}

/// Validates a JSON encoded polish-notation filter parameter.
#[derive(Debug, Clone)]
pub struct PnFilterRule {
    name: String,
    attributes: Vec<String>,
}

impl PnFilterRule {
    /// Creates the rule for parameter `name` and its valid attributes.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }
}

impl ParameterRule for PnFilterRule {
    fn should_validate_parameter(&self, parameter: &Parameter) -> bool {
        parameter.name() == self.name
    }

    fn validate(&self, parameter: &Parameter, errors: &mut ValidationErrors) -> bool {
        let raw = parameter.value().unwrap_or_default();
        let node = match serde_json::from_str::<Value>(raw) {
            Ok(node) => node,
            Err(error) => {
                errors.push(ValidationError::bad_parameter(
                    parameter,
                    format!("\"{}\" must be valid JSON: {error}", parameter.name()),
                ));
                return false;
            }
        };

        match validate_polish_notation(&node, &self.attributes) {
            Ok(()) => true,
            Err(details) => {
                debug!(parameter = parameter.name(), %details, "rejected filter expression");
                errors.push(ValidationError::bad_parameter(parameter, details));
                false
            }
        }
    }
}
