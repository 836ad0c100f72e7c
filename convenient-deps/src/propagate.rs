//! Outdatedness propagation.
//!
//! Turns a set of change events into the set of items that must be
//! recompiled. Starting from the changed items, the propagator walks
//! dependency edges breadth-first from source to dependent, following an
//! edge only when its descriptor is triggered by what changed on the source.
//!
//! A dependent reached this way is recompiled, so its own facets may change
//! as well. [`PropagationOptions::assumed_changes`] lists the facets assumed
//! to change on every outdated item (by default only `compiled_content`);
//! items that also appear in a change event contribute those facets too.

use crate::{ChangeEvent, DependencyStore, Facet, FacetChange, GraphBaseline, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use tracing::{debug, info, warn};

/// Tunables for propagation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationOptions {
    /// Facets assumed to change on any item that gets recompiled.
    pub assumed_changes: BTreeSet<Facet>,
}

impl Default for PropagationOptions {
    fn default() -> Self {
        Self {
            assumed_changes: BTreeSet::from([Facet::CompiledContent]),
        }
    }
}

/// Why an item is outdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum OutdatednessReason {
    /// The item itself was reported as changed.
    Changed {
        /// Facets named by its change events.
        facets: BTreeSet<Facet>,
    },
    /// A dependency edge was triggered.
    Dependency {
        /// The item whose change triggered the edge.
        source: ItemId,
        /// The facet of `source` that triggered it.
        facet: Facet,
    },
    /// No usable dependency graph was available.
    FullRebuild,
}

impl fmt::Display for OutdatednessReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutdatednessReason::Changed { facets } => {
                let names: Vec<_> = facets.iter().map(|facet| facet.name()).collect();
                write!(f, "changed ({})", names.join(", "))
            }
            OutdatednessReason::Dependency { source, facet } => {
                write!(f, "depends on {facet} of {source}")
            }
            OutdatednessReason::FullRebuild => f.write_str("dependency graph unavailable"),
        }
    }
}

/// The items that must be recompiled, each with the first reason found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outdatedness {
    reasons: BTreeMap<ItemId, OutdatednessReason>,
}

impl Outdatedness {
    /// Mark every given item outdated because no graph is available.
    pub fn full_rebuild(items: impl IntoIterator<Item = ItemId>) -> Self {
        Self {
            reasons: items
                .into_iter()
                .map(|item| (item, OutdatednessReason::FullRebuild))
                .collect(),
        }
    }

    /// Whether `item` must be recompiled.
    #[must_use]
    pub fn contains(&self, item: &ItemId) -> bool {
        self.reasons.contains_key(item)
    }

    /// Why `item` must be recompiled.
    #[must_use]
    pub fn reason(&self, item: &ItemId) -> Option<&OutdatednessReason> {
        self.reasons.get(item)
    }

    /// Outdated items in id order.
    pub fn items(&self) -> impl Iterator<Item = &ItemId> {
        self.reasons.keys()
    }

    /// Outdated items with their reasons, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, &OutdatednessReason)> {
        self.reasons.iter()
    }

    /// Number of outdated items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    /// Whether nothing is outdated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    /// Drop items that no longer exist. Returns how many were outdated.
    pub fn exclude<'i>(&mut self, items: impl IntoIterator<Item = &'i ItemId>) -> usize {
        items
            .into_iter()
            .filter(|item| self.reasons.remove(*item).is_some())
            .count()
    }

    /// The set of outdated item ids, for handing to the compilation driver.
    #[must_use]
    pub fn into_items(self) -> BTreeSet<ItemId> {
        self.reasons.into_keys().collect()
    }
}

/// Computes outdated items from change events over a dependency store.
#[derive(Debug)]
pub struct OutdatednessPropagator<'a> {
    store: &'a DependencyStore,
    options: PropagationOptions,
}

impl<'a> OutdatednessPropagator<'a> {
    /// Create a propagator with default options.
    #[must_use]
    pub fn new(store: &'a DependencyStore) -> Self {
        Self::with_options(store, PropagationOptions::default())
    }

    /// Create a propagator with the given options.
    #[must_use]
    pub fn with_options(store: &'a DependencyStore, options: PropagationOptions) -> Self {
        Self { store, options }
    }

    /// Compute the outdated items for `events`.
    ///
    /// Every item named by an event is outdated. Each item is visited at
    /// most once, so cycles terminate.
    #[must_use]
    pub fn propagate(&self, events: &[ChangeEvent]) -> Outdatedness {
        let mut changes: BTreeMap<&ItemId, Vec<&FacetChange>> = BTreeMap::new();
        for event in events {
            changes.entry(&event.item).or_default().extend(&event.changes);
        }

        let mut reasons = BTreeMap::new();
        let mut queue = VecDeque::new();
        for (item, facet_changes) in &changes {
            let facets = facet_changes.iter().map(|change| change.facet).collect();
            let _ = reasons.insert((*item).clone(), OutdatednessReason::Changed { facets });
            queue.push_back((*item).clone());
        }

        let assumed: Vec<FacetChange> = self
            .options
            .assumed_changes
            .iter()
            .map(|facet| FacetChange::whole(*facet))
            .collect();

        while let Some(item) = queue.pop_front() {
            let step: Vec<&FacetChange> = changes
                .get(&item)
                .into_iter()
                .flatten()
                .copied()
                .chain(&assumed)
                .collect();

            for (dependent, props) in self.store.successors(&item) {
                if reasons.contains_key(dependent) {
                    continue;
                }
                let Some(change) = step.iter().find(|change| change.triggers(props)) else {
                    continue;
                };

                debug!(
                    %dependent,
                    source = %item,
                    facet = %change.facet,
                    props = %props,
                    "Dependency triggered"
                );
                let _ = reasons.insert(
                    dependent.clone(),
                    OutdatednessReason::Dependency {
                        source: item.clone(),
                        facet: change.facet,
                    },
                );
                queue.push_back(dependent.clone());
            }
        }

        info!(
            changed = changes.len(),
            outdated = reasons.len(),
            "Outdatedness propagation finished"
        );
        Outdatedness { reasons }
    }
}

/// Compute outdated items against a baseline that may be unavailable.
///
/// With a loaded graph this is [`OutdatednessPropagator::propagate`]. Without
/// one, every item in `known_items` and every item named by an event is
/// outdated.
pub fn propagate_baseline(
    baseline: &GraphBaseline,
    events: &[ChangeEvent],
    known_items: impl IntoIterator<Item = ItemId>,
    options: PropagationOptions,
) -> Outdatedness {
    match baseline {
        GraphBaseline::Loaded(store) => {
            OutdatednessPropagator::with_options(store, options).propagate(events)
        }
        GraphBaseline::Unavailable(reason) => {
            warn!(%reason, "No usable dependency graph, rebuilding everything");
            Outdatedness::full_rebuild(
                known_items
                    .into_iter()
                    .chain(events.iter().map(|event| event.item.clone())),
            )
        }
    }
}
