//! The dependency graph store.
//!
//! Edges point from a dependent item to the source item it read. Each
//! ordered pair holds exactly one [`DependencyProps`]; repeated observations
//! are merged into it.

use crate::{DependencyProps, DepsError, DepsResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use tracing::{debug, info};

/// Identifier of an item in the source tree, e.g. `/posts/hello.md`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Owner of all dependency edges for one compilation run.
///
/// Lookups on unknown items return empty results. Cycles are accepted.
#[derive(Debug, Clone, Default)]
pub struct DependencyStore {
    // dependent -> source -> props
    sources: HashMap<ItemId, HashMap<ItemId, DependencyProps>>,
    // source -> dependents
    dependents: HashMap<ItemId, HashSet<ItemId>>,
}

impl DependencyStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `dependent` relies on `source` as described by `props`.
    ///
    /// Creates the edge, or merges `props` into the existing one.
    pub fn record(
        &mut self,
        dependent: impl Into<ItemId>,
        source: impl Into<ItemId>,
        props: &DependencyProps,
    ) {
        let dependent = dependent.into();
        let source = source.into();

        let _ = self
            .dependents
            .entry(source.clone())
            .or_default()
            .insert(dependent.clone());

        let edges = self.sources.entry(dependent.clone()).or_default();
        match edges.get_mut(&source) {
            Some(existing) => {
                let merged = existing.merge(props);
                debug!(%dependent, %source, from = %existing, to = %merged, "Merged dependency");
                *existing = merged;
            }
            None => {
                debug!(%dependent, %source, props = %props, "New dependency");
                let _ = edges.insert(source, props.clone());
            }
        }
    }

    /// Descriptor of the edge from `dependent` to `source`, if any.
    #[must_use]
    pub fn props(&self, dependent: &ItemId, source: &ItemId) -> Option<&DependencyProps> {
        self.sources.get(dependent).and_then(|edges| edges.get(source))
    }

    /// Items that depend on `source`, with their descriptors, sorted by id.
    #[must_use]
    pub fn successors(&self, source: &ItemId) -> Vec<(&ItemId, &DependencyProps)> {
        let Some(dependents) = self.dependents.get(source) else {
            return Vec::new();
        };
        let mut result: Vec<_> = dependents
            .iter()
            .filter_map(|dependent| {
                self.props(dependent, source).map(|props| (dependent, props))
            })
            .collect();
        result.sort_by(|a, b| a.0.cmp(b.0));
        result
    }

    /// Items that `dependent` relies on, with their descriptors, sorted by id.
    #[must_use]
    pub fn predecessors(&self, dependent: &ItemId) -> Vec<(&ItemId, &DependencyProps)> {
        let Some(edges) = self.sources.get(dependent) else {
            return Vec::new();
        };
        let mut result: Vec<_> = edges.iter().collect();
        result.sort_by(|a, b| a.0.cmp(b.0));
        result
    }

    /// Delete every edge in which `id` takes part. Returns the number of
    /// edges removed.
    pub fn remove_item(&mut self, id: &ItemId) -> usize {
        let mut removed = 0;

        if let Some(edges) = self.sources.remove(id) {
            for source in edges.keys() {
                if let Some(dependents) = self.dependents.get_mut(source) {
                    let _ = dependents.remove(id);
                    if dependents.is_empty() {
                        let _ = self.dependents.remove(source);
                    }
                }
            }
            removed += edges.len();
        }

        if let Some(dependents) = self.dependents.remove(id) {
            for dependent in dependents {
                if let Some(edges) = self.sources.get_mut(&dependent) {
                    if edges.remove(id).is_some() {
                        removed += 1;
                    }
                    if edges.is_empty() {
                        let _ = self.sources.remove(&dependent);
                    }
                }
            }
        }

        if removed > 0 {
            info!(item = %id, edges = removed, "Removed item from dependency graph");
        }
        removed
    }

    /// Drop every edge.
    pub fn clear(&mut self) {
        self.sources.clear();
        self.dependents.clear();
    }

    /// Whether `id` takes part in any edge.
    #[must_use]
    pub fn contains_item(&self, id: &ItemId) -> bool {
        self.sources.contains_key(id) || self.dependents.contains_key(id)
    }

    /// Like [`contains_item`](Self::contains_item), for callers that treat
    /// absence as an error.
    ///
    /// # Errors
    ///
    /// Returns `DepsError::UnknownItem` if `id` has no edges.
    pub fn require_item(&self, id: &ItemId) -> DepsResult<()> {
        if self.contains_item(id) {
            Ok(())
        } else {
            Err(DepsError::UnknownItem(id.clone()))
        }
    }

    /// Every item that takes part in at least one edge.
    #[must_use]
    pub fn items(&self) -> BTreeSet<&ItemId> {
        self.sources.keys().chain(self.dependents.keys()).collect()
    }

    /// Number of items that take part in at least one edge.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items().len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.sources.values().map(HashMap::len).sum()
    }

    /// Whether the store holds no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// All edges as `(dependent, source, props)`, sorted by dependent then
    /// source.
    #[must_use]
    pub fn edges(&self) -> Vec<(&ItemId, &ItemId, &DependencyProps)> {
        let mut result: Vec<_> = self
            .sources
            .iter()
            .flat_map(|(dependent, edges)| {
                edges.iter().map(move |(source, props)| (dependent, source, props))
            })
            .collect();
        result.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        result
    }

    /// Find cycles in the graph, following edges from source to dependent.
    ///
    /// Each cycle is listed once, starting at the first item the search
    /// reached.
    #[must_use]
    pub fn find_cycles(&self) -> Vec<Vec<ItemId>> {
        let mut cycles = Vec::new();
        let mut visited = HashSet::new();
        let mut on_stack = HashSet::new();
        // (item, its dependents, index of the next dependent to visit)
        let mut stack: Vec<(&ItemId, Vec<&ItemId>, usize)> = Vec::new();

        for root in self.items() {
            if !visited.insert(root) {
                continue;
            }
            let _ = on_stack.insert(root);
            stack.push((root, self.dependent_ids(root), 0));

            while let Some(frame) = stack.last_mut() {
                let next = frame.1.get(frame.2).copied();
                frame.2 += 1;

                let Some(next) = next else {
                    let done = frame.0;
                    let _ = stack.pop();
                    let _ = on_stack.remove(done);
                    continue;
                };

                if visited.insert(next) {
                    let _ = on_stack.insert(next);
                    stack.push((next, self.dependent_ids(next), 0));
                } else if on_stack.contains(next) {
                    if let Some(start) = stack.iter().position(|(p, _, _)| *p == next) {
                        let cycle = stack[start..].iter().map(|(p, _, _)| (*p).clone());
                        cycles.push(cycle.collect());
                    }
                }
            }
        }

        cycles
    }

    fn dependent_ids(&self, id: &ItemId) -> Vec<&ItemId> {
        self.successors(id).into_iter().map(|(dependent, _)| dependent).collect()
    }
}
