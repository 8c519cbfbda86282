use std::collections::BTreeSet;

use mailapi_domain::ResourceQuery;

use crate::rules::QueryRule;
use crate::validation::{ValidationError, ValidationErrors};

/// Rejects queries carrying parameters outside an allowed set of names.
#[derive(Debug, Clone)]
pub struct ParameterNamesInListQueryRule {
    allowed: BTreeSet<String>,
}

impl ParameterNamesInListQueryRule {
    /// Creates the rule for the allowed parameter names.
    #[must_use]
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the allowed names in lexical order.
    #[must_use]
    pub fn allowed(&self) -> Vec<&str> {
        self.allowed.iter().map(String::as_str).collect()
    }
}

impl QueryRule for ParameterNamesInListQueryRule {
    fn validate(&self, query: &ResourceQuery<'_>, errors: &mut ValidationErrors) -> bool {
        let additional = query
            .all_parameter_names()
            .into_iter()
            .filter(|name| !self.allowed.contains(*name))
            .collect::<Vec<_>>();

        if additional.is_empty() {
            return true;
        }

        errors.push(ValidationError::bad_query(
            query,
            format!(
                "found additional parameters {}; allowed parameters for \"{}\" are {}",
                additional.join(", "),
                query.resource_target().type_name(),
                self.allowed().join(", ")
            ),
        ));
        false
    }
}
