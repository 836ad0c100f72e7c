//! Errors surfaced by the command-line tool.

use convenient_deps::DepsError;
use std::path::PathBuf;

/// Error type for all `recompile` commands.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Failure inside the dependency engine.
    #[error(transparent)]
    Deps(#[from] DepsError),

    /// I/O failure outside the engine.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file could not be parsed.
    #[error("Invalid configuration in {path}: {source}")]
    Config {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// An input file did not contain the expected JSON.
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// No built-in or registered command has this name.
    #[error("Unknown command `{0}`")]
    UnknownCommand(String),

    /// A command name was registered twice.
    #[error("Command `{0}` is already registered")]
    DuplicateCommand(String),
}

pub type Result<T> = std::result::Result<T, CliError>;
