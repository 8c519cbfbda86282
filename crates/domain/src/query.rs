use std::collections::HashSet;

use mailapi_core::{AppError, AppResult, TypedList};

use crate::parameter::Parameter;
use crate::relationship::RelationshipWalker;
use crate::resource::{ResourceDescription, ResourceGraph};

/// Client query decomposed into parameters and bound to a target resource.
#[derive(Debug, Clone)]
pub struct ResourceQuery<'g> {
    graph: &'g ResourceGraph,
    target: &'g ResourceDescription,
    parameters: TypedList<Parameter>,
}

impl<'g> ResourceQuery<'g> {
    /// Creates a query for `target_type` with already decoded parameters.
    pub fn new(
        graph: &'g ResourceGraph,
        target_type: &str,
        parameters: Vec<Parameter>,
    ) -> AppResult<Self> {
        let target = graph.require(target_type)?;

        let mut seen_names = HashSet::new();
        for parameter in &parameters {
            if !seen_names.insert(parameter.name()) {
                return Err(AppError::Conflict(format!(
                    "duplicate query parameter '{}'",
                    parameter.name()
                )));
            }
        }

        Ok(Self {
            graph,
            target,
            parameters: parameters.into(),
        })
    }

    /// Creates a query from `(name, value)` pairs.
    pub fn from_pairs<I, K, V>(
        graph: &'g ResourceGraph,
        target_type: &str,
        pairs: I,
    ) -> AppResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let parameters = pairs
            .into_iter()
            .map(|(name, value)| Parameter::with_value(name, value))
            .collect::<AppResult<Vec<_>>>()?;

        Self::new(graph, target_type, parameters)
    }

    /// Returns the resource the query addresses.
    #[must_use]
    pub fn resource_target(&self) -> &'g ResourceDescription {
        self.target
    }

    /// Returns a relationship walker rooted at the target.
    #[must_use]
    pub fn walker(&self) -> RelationshipWalker<'g> {
        self.graph.walk(self.target)
    }

    /// Returns every parameter in request order.
    #[must_use]
    pub fn all_parameters(&self) -> &TypedList<Parameter> {
        &self.parameters
    }

    /// Returns every parameter name in request order.
    #[must_use]
    pub fn all_parameter_names(&self) -> Vec<&str> {
        self.parameters.map(Parameter::name)
    }

    /// Returns the parameter called `name`.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.find_by(|parameter| parameter.name() == name)
    }
}
