//! Query validation, repository query access and IMAP search translation.

#![forbid(unsafe_code)]

mod config;
mod imap_search;
mod repository_query;
pub mod rules;
mod validation;
mod validator;

pub use config::QueryValidationConfig;
pub use imap_search::{ImapSearchCriteria, to_search_criteria};
pub use repository_query::{JsonApiRepositoryQuery, RepositoryQuery};
pub use validation::{BAD_REQUEST, ValidationError, ValidationErrors, ValidationSource};
pub use validator::{
    CollectionQueryValidator, FILTER_PARAMETER, INCLUDE_PARAMETER, PAGE_LIMIT_PARAMETER,
    PAGE_START_PARAMETER, QueryValidator, ResourceQueryValidator, SORT_PARAMETER, included_types,
    is_reserved_parameter,
};
