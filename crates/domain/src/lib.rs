//! Resource descriptions, relationship traversal, queries and filter
//! expressions.

#![forbid(unsafe_code)]

mod expression;
mod parameter;
mod query;
mod relationship;
mod resource;
mod sort;

pub use expression::{
    Expression, FunctionalOperator, LogicalOperator, Operator, RelationalOperator,
};
pub use parameter::{FIELDS_GROUP, Parameter, RELFIELD_PREFIX, fieldset_parameter_name};
pub use query::ResourceQuery;
pub use relationship::RelationshipWalker;
pub use resource::{
    ResourceDescription, ResourceDescriptionInput, ResourceGraph, ResourceGraphBuilder, ResourceId,
};
pub use sort::{SortDirection, SortField};
