//! Persisting the dependency graph between runs.
//!
//! The graph is stored as JSON together with a SHA-256 checksum of its
//! edges. Loading fails fast on any mismatch: a graph that silently lost
//! edges would lead to missed recompilations.

use crate::{DependencyProps, DependencyStore, DepsError, DepsResult, Facet, FacetState, ItemId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

/// Version of the persisted format.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PersistedEdge {
    dependent: ItemId,
    source: ItemId,
    props: DependencyProps,
}

/// On-disk form of a [`DependencyStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersistedGraph {
    version: u32,
    checksum: String,
    edges: Vec<PersistedEdge>,
}

impl PersistedGraph {
    /// Snapshot a store.
    #[must_use]
    pub fn from_store(store: &DependencyStore) -> Self {
        let edges: Vec<_> = store
            .edges()
            .into_iter()
            .map(|(dependent, source, props)| PersistedEdge {
                dependent: dependent.clone(),
                source: source.clone(),
                props: props.clone(),
            })
            .collect();
        Self {
            version: FORMAT_VERSION,
            checksum: edges_checksum(&edges),
            edges,
        }
    }

    /// Number of edges in the snapshot.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Rebuild the store.
    ///
    /// # Errors
    ///
    /// Returns `DepsError::CorruptPersistedGraph` on a version or checksum
    /// mismatch, or when an ordered pair appears more than once.
    pub fn into_store(self) -> DepsResult<DependencyStore> {
        if self.version != FORMAT_VERSION {
            return Err(DepsError::CorruptPersistedGraph(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                self.version
            )));
        }
        let actual = edges_checksum(&self.edges);
        if actual != self.checksum {
            return Err(DepsError::CorruptPersistedGraph(format!(
                "checksum mismatch: recorded {}, computed {actual}",
                self.checksum
            )));
        }

        let mut seen = HashSet::new();
        let mut store = DependencyStore::new();
        for edge in self.edges {
            if !seen.insert((edge.dependent.clone(), edge.source.clone())) {
                return Err(DepsError::CorruptPersistedGraph(format!(
                    "duplicate edge {} -> {}",
                    edge.dependent, edge.source
                )));
            }
            store.record(edge.dependent, edge.source, &edge.props);
        }
        Ok(store)
    }

    /// Parse a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns `DepsError::CorruptPersistedGraph` if the text does not have
    /// the expected shape.
    pub fn from_json(json: &str) -> DepsResult<Self> {
        serde_json::from_str(json).map_err(|e| DepsError::CorruptPersistedGraph(e.to_string()))
    }

    /// Render the snapshot as pretty-printed JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        // Only strings, booleans and sets of strings: rendering cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

fn edges_checksum(edges: &[PersistedEdge]) -> String {
    let mut hasher = Sha256::new();
    for edge in edges {
        hasher.update(edge.dependent.as_str().as_bytes());
        hasher.update(b"\0");
        hasher.update(edge.source.as_str().as_bytes());
        hasher.update(b"\0");
        for facet in Facet::ALL {
            match edge.props.state(facet) {
                FacetState::Inactive => hasher.update(b"-"),
                FacetState::Full => hasher.update(b"*"),
                FacetState::Partial(ids) => {
                    hasher.update(b"[");
                    for id in ids {
                        hasher.update(id.as_bytes());
                        hasher.update(b"\x1f");
                    }
                    hasher.update(b"]");
                }
            }
        }
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

/// Write the store to `path`.
///
/// # Errors
///
/// Returns `DepsError::Io` if the file cannot be written.
pub fn save_graph(store: &DependencyStore, path: &Path) -> DepsResult<()> {
    let snapshot = PersistedGraph::from_store(store);
    write_json_atomic(&snapshot, path)?;
    info!(path = %path.display(), edges = snapshot.edge_count(), "Saved dependency graph");
    Ok(())
}

/// Write `value` as pretty JSON next to `path` and rename it into place, so
/// an interrupted save leaves the previous file intact.
pub(crate) fn write_json_atomic<T: Serialize>(value: &T, path: &Path) -> DepsResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("tmp");
    {
        let mut writer = BufWriter::new(fs::File::create(&tmp)?);
        serde_json::to_writer_pretty(&mut writer, value).map_err(std::io::Error::from)?;
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Read a store previously written by [`save_graph`].
///
/// # Errors
///
/// Returns `DepsError::Io` if the file cannot be read and
/// `DepsError::CorruptPersistedGraph` if its contents are invalid.
pub fn load_graph(path: &Path) -> DepsResult<DependencyStore> {
    let json = fs::read_to_string(path)?;
    let store = PersistedGraph::from_json(&json)?.into_store()?;
    info!(path = %path.display(), edges = store.edge_count(), "Loaded dependency graph");
    Ok(store)
}

/// The previous run's graph, or the reason it cannot be used.
#[derive(Debug, Clone)]
pub enum GraphBaseline {
    /// A usable graph. Empty on the first run.
    Loaded(DependencyStore),
    /// The graph exists but could not be loaded.
    Unavailable(String),
}

impl GraphBaseline {
    /// The loaded store, if any.
    #[must_use]
    pub fn store(&self) -> Option<&DependencyStore> {
        match self {
            GraphBaseline::Loaded(store) => Some(store),
            GraphBaseline::Unavailable(_) => None,
        }
    }
}

/// Load the baseline graph for a new run.
///
/// A missing file yields an empty graph. Any other failure yields
/// [`GraphBaseline::Unavailable`], which callers should answer with a full
/// rebuild.
#[must_use]
pub fn load_baseline(path: &Path) -> GraphBaseline {
    if !path.exists() {
        info!(path = %path.display(), "No dependency graph yet, starting empty");
        return GraphBaseline::Loaded(DependencyStore::new());
    }
    match load_graph(path) {
        Ok(store) => GraphBaseline::Loaded(store),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot use dependency graph");
            GraphBaseline::Unavailable(e.to_string())
        }
    }
}
