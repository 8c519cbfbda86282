use std::collections::BTreeSet;

use mailapi_domain::Parameter;

use crate::rules::ParameterRule;
use crate::validation::{ValidationError, ValidationErrors};
use crate::validator::INCLUDE_PARAMETER;

/// Reduces include paths to the deepest ones.
///
/// Intermediate resources of a multi-segment include are implied, so
/// `MailFolder` is dropped when `MailFolder.MailAccount` is requested too.
/// Duplicates collapse onto their first occurrence and order is preserved.
#[must_use]
pub fn merge_includes<'a>(includes: &[&'a str]) -> Vec<&'a str> {
    let mut unique: Vec<&'a str> = Vec::with_capacity(includes.len());
    for include in includes {
        if !unique.contains(include) {
            unique.push(include);
        }
    }

    unique
        .iter()
        .filter(|candidate| !unique.iter().any(|other| extends(other, candidate)))
        .copied()
        .collect()
}

fn extends(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('.'))
}

/// Checks the `include` parameter against the reachable relationship paths.
#[derive(Debug, Clone)]
pub struct IncludeRule {
    whitelist: BTreeSet<String>,
}

impl IncludeRule {
    /// Creates the rule for the given valid include paths.
    #[must_use]
    pub fn new<I, S>(whitelist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            whitelist: whitelist.into_iter().map(Into::into).collect(),
        }
    }
}

impl ParameterRule for IncludeRule {
    fn should_validate_parameter(&self, parameter: &Parameter) -> bool {
        parameter.name() == INCLUDE_PARAMETER
    }

    fn validate(&self, parameter: &Parameter, errors: &mut ValidationErrors) -> bool {
        let requested = parameter.list_value();
        let unknown = merge_includes(&requested)
            .into_iter()
            .filter(|path| !self.whitelist.contains(*path))
            .collect::<Vec<_>>();

        if unknown.is_empty() {
            return true;
        }

        errors.push(ValidationError::bad_parameter(
            parameter,
            format!(
                "\"{INCLUDE_PARAMETER}\" references unknown relationships: {}",
                unknown.join(", ")
            ),
        ));
        false
    }
}
