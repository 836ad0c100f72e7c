//! Change events reported by change detection.

use crate::{DependencyProps, Facet, FacetState, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A change to one facet of an item.
///
/// `identifiers` narrows a `raw_content` or `attributes` change to specific
/// sub-parts. `None` means the granularity is unknown and every sub-part may
/// have changed. Identifiers on `compiled_content` and `path` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetChange {
    /// The facet that changed.
    pub facet: Facet,
    /// Sub-identifiers that changed, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifiers: Option<BTreeSet<String>>,
}

impl FacetChange {
    /// A change to the whole facet, without sub-identifier detail.
    #[must_use]
    pub fn whole(facet: Facet) -> Self {
        Self {
            facet,
            identifiers: None,
        }
    }

    /// A change restricted to the given sub-identifiers.
    pub fn partial<I, S>(facet: Facet, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            facet,
            identifiers: Some(identifiers.into_iter().map(Into::into).collect()),
        }
    }

    /// Whether an edge carrying `props` must be followed for this change.
    ///
    /// A partial reliance is only triggered when one of its identifiers was
    /// named by the change, or when the change carries no identifiers at all.
    /// Raw content identifiers may be glob patterns.
    #[must_use]
    pub fn triggers(&self, props: &DependencyProps) -> bool {
        let state = match self.facet {
            Facet::RawContent => props.raw_content(),
            Facet::Attributes => props.attributes(),
            Facet::CompiledContent | Facet::Path => return props.is_active(self.facet),
        };

        match state {
            FacetState::Inactive => false,
            FacetState::Full => true,
            FacetState::Partial(relied) => match &self.identifiers {
                None => !relied.is_empty(),
                Some(changed) => changed
                    .iter()
                    .any(|id| relied.iter().any(|entry| self.matches(entry, id))),
            },
        }
    }

    fn matches(&self, entry: &str, changed: &str) -> bool {
        if entry == changed {
            return true;
        }
        self.facet == Facet::RawContent
            && glob::Pattern::new(entry).is_ok_and(|pattern| pattern.matches(changed))
    }
}

/// Everything change detection knows about one changed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// The changed item.
    pub item: ItemId,
    /// The facets that changed.
    pub changes: Vec<FacetChange>,
}

impl ChangeEvent {
    /// An event for `item` with no facet changes yet.
    pub fn new(item: impl Into<ItemId>) -> Self {
        Self {
            item: item.into(),
            changes: Vec::new(),
        }
    }

    /// An event where every facet of `item` changed without detail.
    pub fn everything(item: impl Into<ItemId>) -> Self {
        Self {
            item: item.into(),
            changes: Facet::ALL.into_iter().map(FacetChange::whole).collect(),
        }
    }

    /// Add a facet change.
    #[must_use]
    pub fn with(mut self, change: FacetChange) -> Self {
        self.changes.push(change);
        self
    }

    /// Facets named by this event.
    #[must_use]
    pub fn facets(&self) -> BTreeSet<Facet> {
        self.changes.iter().map(|change| change.facet).collect()
    }
}
