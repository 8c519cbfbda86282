use mailapi_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Name prefix marking a fieldset relative to the default fields.
pub const RELFIELD_PREFIX: &str = "relfield:";

/// Group name used by sparse fieldset parameters (`fields[TYPE]`).
pub const FIELDS_GROUP: &str = "fields";

/// One named query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    name: NonEmptyString,
    value: Option<String>,
}

impl Parameter {
    /// Creates a parameter with an optional value.
    pub fn new(name: impl Into<String>, value: Option<String>) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?,
            value,
        })
    }

    /// Creates a parameter carrying `value`.
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> AppResult<Self> {
        Self::new(name, Some(value.into()))
    }

    /// Returns the full parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the raw value.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Returns whether the name carries the `relfield:` prefix.
    #[must_use]
    pub fn is_relative(&self) -> bool {
        self.name().starts_with(RELFIELD_PREFIX)
    }

    /// Returns the name without a `relfield:` prefix.
    #[must_use]
    pub fn base_name(&self) -> &str {
        self.name()
            .strip_prefix(RELFIELD_PREFIX)
            .unwrap_or(self.name())
    }

    /// Returns `key` when the base name reads `group[key]`.
    #[must_use]
    pub fn group_key(&self, group: &str) -> Option<&str> {
        let (name, key) = split_group(self.base_name())?;
        (name == group).then_some(key)
    }

    /// Returns the resource type of a `fields[TYPE]` parameter.
    #[must_use]
    pub fn fieldset_type(&self) -> Option<&str> {
        self.group_key(FIELDS_GROUP)
    }

    /// Splits the value on commas, trimming entries and skipping empty ones.
    #[must_use]
    pub fn list_value(&self) -> Vec<&str> {
        self.value()
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Builds the parameter name for a sparse fieldset of `type_name`.
#[must_use]
pub fn fieldset_parameter_name(type_name: &str, relative: bool) -> String {
    if relative {
        format!("{RELFIELD_PREFIX}{FIELDS_GROUP}[{type_name}]")
    } else {
        format!("{FIELDS_GROUP}[{type_name}]")
    }
}

fn split_group(name: &str) -> Option<(&str, &str)> {
    let inner = name.strip_suffix(']')?;
    let (group, key) = inner.split_once('[')?;
    if group.is_empty() || key.is_empty() || key.contains(['[', ']']) {
        return None;
    }

    Some((group, key))
}
