//! Terminal capabilities: UTF-8 and color support.
//!
//! Detected once at startup and handed to commands; nothing in the
//! dependency engine looks at the terminal.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;

/// User preference for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    /// Color when writing to a terminal and `NO_COLOR` is unset.
    #[default]
    Auto,
    /// Always color.
    Always,
    /// Never color.
    Never,
}

/// What the output stream supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentCapabilities {
    pub utf8: bool,
    pub color: bool,
}

impl EnvironmentCapabilities {
    /// Inspect stdout and the process environment.
    pub fn detect(choice: ColorChoice) -> Self {
        Self::detect_with(choice, std::io::stdout().is_terminal(), |key| {
            std::env::var(key).ok()
        })
    }

    fn detect_with(choice: ColorChoice, is_tty: bool, var: impl Fn(&str) -> Option<String>) -> Self {
        // Pipes and files get UTF-8; only terminals are checked for a locale.
        let utf8 = !is_tty
            || ["LC_ALL", "LC_CTYPE", "LANG"]
                .iter()
                .any(|key| var(key).is_some_and(|v| v.to_uppercase().contains("UTF")));

        let color = match choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => is_tty && var("NO_COLOR").is_none(),
        };

        Self { utf8, color }
    }

    /// Make `colored` follow the detected color support.
    pub fn apply(&self) {
        colored::control::set_override(self.color);
    }

    /// Arrow used between a dependent and its source.
    pub fn arrow(&self) -> &'static str {
        if self.utf8 { "→" } else { "->" }
    }
}
