//! Command-line surface.

use crate::env::ColorChoice;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Recompile - incremental recompilation from a persisted dependency graph
#[derive(Parser)]
#[command(name = "recompile")]
#[command(about = "Track item dependencies and compute what must be recompiled")]
#[command(version)]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = crate::config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Dependency graph file (overrides the configuration)
    #[arg(long, global = true)]
    pub graph: Option<PathBuf>,

    /// Colorize output
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record that DEPENDENT relies on SOURCE
    Record {
        /// Item that read the source
        dependent: String,

        /// Item that was read
        source: String,

        /// Descriptor as JSON, e.g. '{"attributes": ["title"], "path": true}'
        #[arg(short, long, default_value = "{}")]
        props: String,
    },

    /// Forget every dependency of and on ITEM
    Forget {
        /// Item that was deleted from the source tree
        item: String,
    },

    /// Compute the items to recompile for a set of change events
    Outdated {
        /// JSON file written by `detect`, or a bare list of change events
        #[arg(long)]
        changes: PathBuf,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Detect changes by comparing item snapshots with stored checksums
    Detect {
        /// JSON file mapping item ids to snapshots
        #[arg(long)]
        snapshots: PathBuf,

        /// Store the new checksums for the next run
        #[arg(long)]
        write: bool,
    },

    /// Show what ITEM depends on and what depends on it
    Explain {
        /// Item to explain
        item: String,
    },

    /// Show graph statistics
    Stats,

    /// List dependency cycles
    Cycles,

    /// Commands registered at startup
    #[command(external_subcommand)]
    External(Vec<String>),
}
