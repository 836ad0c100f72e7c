//! Checksum-based change detection.
//!
//! Each run hashes every item's facets. Comparing against the previous run's
//! checksums yields the [`ChangeEvent`]s that feed propagation. Attribute
//! changes are reported per attribute name, so partial reliances on other
//! attributes are not triggered.

use crate::persist::write_json_atomic;
use crate::{ChangeEvent, DepsError, DepsResult, Facet, FacetChange, ItemId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// The facets of one item as produced by the compilation pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    /// Unprocessed source content.
    pub raw_content: String,
    /// Attributes by name.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    /// Compiled output, if the item has been compiled.
    #[serde(default)]
    pub compiled_content: Option<String>,
    /// Output path, if the item is written out.
    #[serde(default)]
    pub path: Option<String>,
}

/// SHA-256 checksums of an item's facets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemChecksums {
    raw_content: String,
    attributes: BTreeMap<String, String>,
    compiled_content: Option<String>,
    path: Option<String>,
}

fn digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

impl ItemChecksums {
    /// Hash a snapshot.
    #[must_use]
    pub fn of(snapshot: &ItemSnapshot) -> Self {
        Self {
            raw_content: digest(snapshot.raw_content.as_bytes()),
            attributes: snapshot
                .attributes
                .iter()
                .map(|(name, value)| (name.clone(), digest(value.to_string().as_bytes())))
                .collect(),
            compiled_content: snapshot.compiled_content.as_deref().map(|c| digest(c.as_bytes())),
            path: snapshot.path.as_deref().map(|p| digest(p.as_bytes())),
        }
    }

    /// Facet changes between `self` (older) and `newer`.
    #[must_use]
    pub fn diff(&self, newer: &ItemChecksums) -> Vec<FacetChange> {
        let mut changes = Vec::new();

        if self.raw_content != newer.raw_content {
            changes.push(FacetChange::whole(Facet::RawContent));
        }

        let names: BTreeSet<&String> = self.attributes.keys().chain(newer.attributes.keys()).collect();
        let changed: Vec<&String> = names
            .into_iter()
            .filter(|name| self.attributes.get(*name) != newer.attributes.get(*name))
            .collect();
        if !changed.is_empty() {
            changes.push(FacetChange::partial(Facet::Attributes, changed));
        }

        if self.compiled_content != newer.compiled_content {
            changes.push(FacetChange::whole(Facet::CompiledContent));
        }
        if self.path != newer.path {
            changes.push(FacetChange::whole(Facet::Path));
        }

        changes
    }
}

/// Result of comparing a run's snapshots with the previous checksums.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedChanges {
    /// One event per new, modified or removed item.
    ///
    /// New and removed items report every facet as changed, so whatever
    /// relied on them is recompiled.
    pub events: Vec<ChangeEvent>,
    /// Items present last run and gone now. After propagation the driver
    /// removes them from the dependency store and does not compile them.
    #[serde(default)]
    pub removed: BTreeSet<ItemId>,
}

/// Checksums of every item from one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChecksumStore {
    items: BTreeMap<ItemId, ItemChecksums>,
}

impl ChecksumStore {
    /// An empty store, as on the first run.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash every snapshot.
    #[must_use]
    pub fn from_snapshots(snapshots: &BTreeMap<ItemId, ItemSnapshot>) -> Self {
        Self {
            items: snapshots
                .iter()
                .map(|(id, snapshot)| (id.clone(), ItemChecksums::of(snapshot)))
                .collect(),
        }
    }

    /// Number of items with checksums.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no checksums are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item ids with checksums.
    pub fn items(&self) -> impl Iterator<Item = &ItemId> {
        self.items.keys()
    }

    /// Compare the stored checksums with this run's snapshots.
    #[must_use]
    pub fn detect_changes(&self, current: &BTreeMap<ItemId, ItemSnapshot>) -> DetectedChanges {
        let mut detected = DetectedChanges::default();

        for (id, snapshot) in current {
            let checksums = ItemChecksums::of(snapshot);
            match self.items.get(id) {
                None => {
                    debug!(item = %id, "New item");
                    detected.events.push(ChangeEvent::everything(id.clone()));
                }
                Some(previous) => {
                    let changes = previous.diff(&checksums);
                    if !changes.is_empty() {
                        debug!(item = %id, changes = changes.len(), "Modified item");
                        detected.events.push(ChangeEvent {
                            item: id.clone(),
                            changes,
                        });
                    }
                }
            }
        }

        for id in self.items.keys().filter(|id| !current.contains_key(*id)) {
            debug!(item = %id, "Removed item");
            detected.events.push(ChangeEvent::everything(id.clone()));
            let _ = detected.removed.insert(id.clone());
        }

        info!(
            events = detected.events.len(),
            removed = detected.removed.len(),
            "Change detection finished"
        );
        detected
    }

    /// Write the checksums to `path` as JSON, replacing the previous file
    /// in one rename.
    ///
    /// # Errors
    ///
    /// Returns `DepsError::Io` if the file cannot be written.
    pub fn save(&self, path: &Path) -> DepsResult<()> {
        write_json_atomic(self, path)
    }

    /// Read checksums written by [`save`](Self::save). A missing file is an
    /// empty store.
    ///
    /// # Errors
    ///
    /// Returns `DepsError::Io` if the file cannot be read and
    /// `DepsError::CorruptPersistedGraph` if it cannot be parsed.
    pub fn load(path: &Path) -> DepsResult<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| DepsError::CorruptPersistedGraph(format!("{}: {e}", path.display())))
    }
}
