use std::env;

use mailapi_core::{AppError, AppResult};

/// Tunables for the query validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryValidationConfig {
    /// Whether `relfield:fields[TYPE]` accepts the `*` token.
    pub relative_fieldset_wildcard: bool,
    /// Whether `fields[TYPE]=*` is accepted.
    pub fieldset_wildcard: bool,
    /// Largest accepted `page[limit]`.
    pub max_page_limit: u64,
}

impl Default for QueryValidationConfig {
    fn default() -> Self {
        Self {
            relative_fieldset_wildcard: true,
            fieldset_wildcard: true,
            max_page_limit: 500,
        }
    }
}

impl QueryValidationConfig {
    /// Loads the configuration from the process environment.
    ///
    /// Reads `QUERY_RELFIELD_WILDCARD`, `QUERY_FIELDSET_WILDCARD` and
    /// `QUERY_MAX_PAGE_LIMIT`; unset variables keep their defaults.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let relative_fieldset_wildcard = parse_bool(
            &lookup,
            "QUERY_RELFIELD_WILDCARD",
            defaults.relative_fieldset_wildcard,
        )?;
        let fieldset_wildcard = parse_bool(
            &lookup,
            "QUERY_FIELDSET_WILDCARD",
            defaults.fieldset_wildcard,
        )?;
        let max_page_limit = parse_u64(&lookup, "QUERY_MAX_PAGE_LIMIT", defaults.max_page_limit)?;

        if max_page_limit == 0 {
            return Err(AppError::Validation(
                "QUERY_MAX_PAGE_LIMIT must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            relative_fieldset_wildcard,
            fieldset_wildcard,
            max_page_limit,
        })
    }
}

fn parse_bool<F>(lookup: &F, name: &str, default: bool) -> AppResult<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if value.trim().eq_ignore_ascii_case("true") => Ok(true),
        Some(value) if value.trim().eq_ignore_ascii_case("false") => Ok(false),
        Some(value) => Err(AppError::Validation(format!(
            "invalid {name} value '{value}': expected 'true' or 'false'"
        ))),
        None => Ok(default),
    }
}

fn parse_u64<F>(lookup: &F, name: &str, default: u64) -> AppResult<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value.trim().parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}
