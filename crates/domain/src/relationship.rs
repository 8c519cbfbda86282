//! Cycle-safe traversal of resource relationship graphs.

use std::collections::HashSet;

use crate::resource::{ResourceDescription, ResourceGraph, ResourceId};

/// Walks the relationships reachable from one root description.
///
/// The walker only keeps call-local state, so many walkers may traverse the
/// same graph concurrently.
#[derive(Debug, Clone, Copy)]
pub struct RelationshipWalker<'a> {
    graph: &'a ResourceGraph,
    root: &'a ResourceDescription,
}

impl<'a> RelationshipWalker<'a> {
    /// Creates a walker rooted at `root`.
    #[must_use]
    pub fn new(graph: &'a ResourceGraph, root: &'a ResourceDescription) -> Self {
        Self { graph, root }
    }

    /// Returns every reachable description, each resource type at most once.
    ///
    /// Order is depth-first pre-order; the first path reaching a type wins and
    /// that type is never descended again.
    #[must_use]
    pub fn all_relationship_descriptions(&self, with_root: bool) -> Vec<&'a ResourceDescription> {
        let mut descriptions = Vec::new();
        if with_root {
            descriptions.push(self.root);
        }

        self.collect_descriptions(self.root, &mut descriptions);
        descriptions
    }

    /// Returns the types of [`Self::all_relationship_descriptions`].
    #[must_use]
    pub fn all_relationship_types(&self, with_root: bool) -> Vec<&'a str> {
        self.all_relationship_descriptions(with_root)
            .into_iter()
            .map(ResourceDescription::type_name)
            .collect()
    }

    /// Returns dot-notation paths to every reachable description.
    ///
    /// Without the root every direct relationship starts its own path. Those
    /// top-level relationships are not marked as visited up front, so a type
    /// reachable from two of them is listed under both.
    #[must_use]
    pub fn all_relationship_paths(&self, with_root: bool) -> Vec<String> {
        let mut visited = HashSet::new();
        let mut paths = Vec::new();

        if with_root {
            visited.insert(self.root.id());
            self.collect_paths(self.root, &[], &mut visited, &mut paths);
        } else {
            for child in self.children(self.root) {
                self.collect_paths(child, &[], &mut visited, &mut paths);
            }
        }

        paths.into_iter().map(|path| path.join(".")).collect()
    }

    /// Finds a reachable description (root included) by type.
    #[must_use]
    pub fn find_by_type(&self, type_name: &str) -> Option<&'a ResourceDescription> {
        self.all_relationship_descriptions(true)
            .into_iter()
            .find(|description| description.type_name() == type_name)
    }

    fn children(
        &self,
        node: &'a ResourceDescription,
    ) -> impl Iterator<Item = &'a ResourceDescription> + 'a {
        let graph = self.graph;
        node.relationships()
            .iter()
            .filter_map(move |id: &ResourceId| graph.get(*id))
    }

    fn collect_descriptions(
        &self,
        node: &'a ResourceDescription,
        descriptions: &mut Vec<&'a ResourceDescription>,
    ) {
        for child in self.children(node) {
            if descriptions
                .iter()
                .any(|known| known.type_name() == child.type_name())
            {
                continue;
            }

            descriptions.push(child);
            self.collect_descriptions(child, descriptions);
        }
    }

    fn collect_paths(
        &self,
        node: &'a ResourceDescription,
        prefix: &[&'a str],
        visited: &mut HashSet<ResourceId>,
        paths: &mut Vec<Vec<&'a str>>,
    ) {
        let mut path = prefix.to_vec();
        path.push(node.type_name());
        paths.push(path.clone());

        for child in self.children(node) {
            if visited.insert(child.id()) {
                self.collect_paths(child, &path, visited, paths);
            }
        }
    }
}
