use std::collections::{BTreeMap, HashSet};

use mailapi_core::{AppError, AppResult, NonEmptyString};

use crate::relationship::RelationshipWalker;

/// Stable index of a resource description inside its [`ResourceGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(usize);

/// Schema node describing one JSON:API resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescription {
    id: ResourceId,
    type_name: NonEmptyString,
    fields: Vec<String>,
    default_fields: Vec<String>,
    relationships: Vec<ResourceId>,
}

impl ResourceDescription {
    /// Returns the arena identifier.
    #[must_use]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Returns the resource type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.type_name.as_str()
    }

    /// Returns every field this resource can expose.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns the fields used when no sparse fieldset is requested.
    #[must_use]
    pub fn default_fields(&self) -> &[String] {
        &self.default_fields
    }

    /// Returns the direct relationship targets.
    #[must_use]
    pub fn relationships(&self) -> &[ResourceId] {
        &self.relationships
    }

    /// Returns whether `field` is declared on this resource.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|candidate| candidate == field)
    }
}

/// Unresolved resource declaration consumed by [`ResourceGraphBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptionInput {
    /// Resource type.
    pub type_name: String,
    /// All exposable fields.
    pub fields: Vec<String>,
    /// Ordered subset of `fields` returned by default.
    pub default_fields: Vec<String>,
    /// Relationship targets named by resource type.
    pub relationships: Vec<String>,
}

impl ResourceDescriptionInput {
    /// Starts a declaration for `type_name` without fields or relationships.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
            default_fields: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Sets the exposable fields.
    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the default fields.
    #[must_use]
    pub fn default_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the relationship targets.
    #[must_use]
    pub fn relationships<I, S>(mut self, relationships: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relationships = relationships.into_iter().map(Into::into).collect();
        self
    }
}

/// Collects resource declarations and resolves them into a [`ResourceGraph`].
#[derive(Debug, Clone, Default)]
pub struct ResourceGraphBuilder {
    inputs: Vec<ResourceDescriptionInput>,
}

impl ResourceGraphBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one resource declaration.
    #[must_use]
    pub fn resource(mut self, input: ResourceDescriptionInput) -> Self {
        self.inputs.push(input);
        self
    }

    /// Validates every declaration and resolves relationship names.
    pub fn build(self) -> AppResult<ResourceGraph> {
        let mut index = BTreeMap::new();
        for (position, input) in self.inputs.iter().enumerate() {
            let type_name = NonEmptyString::new(input.type_name.clone())?;
            if index
                .insert(type_name.as_str().to_owned(), ResourceId(position))
                .is_some()
            {
                return Err(AppError::Conflict(format!(
                    "duplicate resource type '{}'",
                    type_name.as_str()
                )));
            }
        }

        let mut descriptions = Vec::with_capacity(self.inputs.len());
        for (position, input) in self.inputs.into_iter().enumerate() {
            let ResourceDescriptionInput {
                type_name,
                fields,
                default_fields,
                relationships,
            } = input;

            let mut seen_fields = HashSet::new();
            for field in &fields {
                if field.trim().is_empty() {
                    return Err(AppError::Validation(format!(
                        "resource '{type_name}' declares an empty field name"
                    )));
                }

                if !seen_fields.insert(field.as_str()) {
                    return Err(AppError::Validation(format!(
                        "duplicate field '{field}' on resource '{type_name}'"
                    )));
                }
            }

            if let Some(unknown) = default_fields
                .iter()
                .find(|field| !seen_fields.contains(field.as_str()))
            {
                return Err(AppError::Validation(format!(
                    "default field '{unknown}' is not a field of resource '{type_name}'"
                )));
            }

            let relationships = relationships
                .iter()
                .map(|target| {
                    index.get(target.as_str()).copied().ok_or_else(|| {
                        AppError::NotFound(format!(
                            "relationship target '{target}' of resource '{type_name}'"
                        ))
                    })
                })
                .collect::<AppResult<Vec<_>>>()?;

            descriptions.push(ResourceDescription {
                id: ResourceId(position),
                type_name: NonEmptyString::new(type_name)?,
                fields,
                default_fields,
                relationships,
            });
        }

        Ok(ResourceGraph {
            descriptions,
            index,
        })
    }
}

/// Immutable arena of resource descriptions connected by relationships.
///
/// Relationships may form cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGraph {
    descriptions: Vec<ResourceDescription>,
    index: BTreeMap<String, ResourceId>,
}

impl ResourceGraph {
    /// Returns the description stored under `id`.
    #[must_use]
    pub fn get(&self, id: ResourceId) -> Option<&ResourceDescription> {
        self.descriptions.get(id.0)
    }

    /// Returns the description registered for `type_name`.
    #[must_use]
    pub fn lookup(&self, type_name: &str) -> Option<&ResourceDescription> {
        self.index.get(type_name).and_then(|id| self.get(*id))
    }

    /// Resolves `type_name` or reports it as unknown.
    pub fn require(&self, type_name: &str) -> AppResult<&ResourceDescription> {
        self.lookup(type_name)
            .ok_or_else(|| AppError::NotFound(format!("resource type '{type_name}'")))
    }

    /// Iterates all descriptions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceDescription> {
        self.descriptions.iter()
    }

    /// Returns the number of registered resource types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    /// Returns whether the graph holds no resource types.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }

    /// Starts a relationship traversal at `root`.
    #[must_use]
    pub fn walk<'a>(&'a self, root: &'a ResourceDescription) -> RelationshipWalker<'a> {
        RelationshipWalker::new(self, root)
    }
}
