//! Command implementations.
//!
//! Every command reads the persisted graph, does one thing, and writes the
//! graph back if it changed.

use crate::config::RecompileConfig;
use crate::env::EnvironmentCapabilities;
use crate::error::{CliError, Result};
use convenient_deps::{DependencyProps, DependencyStore, Facet, load_graph, save_graph};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub mod detect;
pub mod dot;
pub mod edit;
pub mod explain;
pub mod outdated;
pub mod stats;

/// Everything a command needs besides its own arguments.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: RecompileConfig,
    pub caps: EnvironmentCapabilities,
}

impl CommandContext {
    /// Load the graph for editing. A missing file is an empty graph; a
    /// corrupt one is an error.
    pub fn load_store(&self) -> Result<DependencyStore> {
        let path = &self.config.graph_file;
        if path.exists() {
            Ok(load_graph(path)?)
        } else {
            Ok(DependencyStore::new())
        }
    }

    pub fn save_store(&self, store: &DependencyStore) -> Result<()> {
        Ok(save_graph(store, &self.config.graph_file)?)
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            config: RecompileConfig::default(),
            caps: EnvironmentCapabilities {
                utf8: false,
                color: false,
            },
        }
    }

    #[cfg(test)]
    pub fn in_dir(dir: &Path) -> Self {
        let mut ctx = Self::for_tests();
        ctx.config.graph_file = dir.join("deps.json");
        ctx.config.checksum_file = dir.join("checksums.json");
        ctx
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Partial identifiers of a descriptor, e.g. `attributes: [date, title]`.
pub(crate) fn describe_partials(props: &DependencyProps) -> String {
    Facet::ALL
        .into_iter()
        .filter_map(|facet| {
            let state = props.state(facet);
            let ids = state.identifiers()?;
            let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
            Some(format!("{facet}: [{}]", ids.join(", ")))
        })
        .collect::<Vec<_>>()
        .join("; ")
}
