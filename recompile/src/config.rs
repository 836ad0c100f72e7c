//! Tool configuration, read from `recompile.yml`.

use crate::env::ColorChoice;
use crate::error::{CliError, Result};
use convenient_deps::{Facet, PropagationOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "recompile.yml";

/// Settings shared by every command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecompileConfig {
    /// Where the dependency graph is persisted between runs.
    pub graph_file: PathBuf,
    /// Where item checksums are persisted between runs.
    pub checksum_file: PathBuf,
    /// Log filter used when `RUST_LOG` is not set.
    pub log_filter: String,
    /// Whether to colorize output.
    pub color: ColorChoice,
    /// Facets assumed to change on every recompiled item.
    pub assumed_changes: BTreeSet<Facet>,
}

impl Default for RecompileConfig {
    fn default() -> Self {
        Self {
            graph_file: PathBuf::from("tmp/recompile/dependencies.json"),
            checksum_file: PathBuf::from("tmp/recompile/checksums.json"),
            log_filter: "recompile=info,convenient_deps=warn".to_string(),
            color: ColorChoice::Auto,
            assumed_changes: PropagationOptions::default().assumed_changes,
        }
    }
}

impl RecompileConfig {
    /// Load the configuration at `path`. A missing file yields defaults.
    ///
    /// Relative state paths are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let mut config = Self::parse(&text).map_err(|source| CliError::Config {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            config.graph_file = base.join(&config.graph_file);
            config.checksum_file = base.join(&config.checksum_file);
        }
        Ok(config)
    }

    /// Parse YAML text.
    pub fn parse(text: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Propagation tunables derived from this configuration.
    pub fn propagation_options(&self) -> PropagationOptions {
        PropagationOptions {
            assumed_changes: self.assumed_changes.clone(),
        }
    }
}
