//! Commands contributed at startup, dispatched by name.

use crate::commands::CommandContext;
use crate::error::{CliError, Result};
use std::collections::BTreeMap;

/// Handler for a registered command. Receives the arguments after the
/// command name.
pub type Handler = Box<dyn Fn(&CommandContext, &[String]) -> Result<()> + Send + Sync>;

/// Name to handler map for commands that are not built into the CLI.
#[derive(Default)]
pub struct CommandRegistry {
    handlers: BTreeMap<String, Handler>,
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.names())
            .finish()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`.
    pub fn register<F>(&mut self, name: &str, handler: F) -> Result<()>
    where
        F: Fn(&CommandContext, &[String]) -> Result<()> + Send + Sync + 'static,
    {
        if self.handlers.contains_key(name) {
            return Err(CliError::DuplicateCommand(name.to_string()));
        }
        let _ = self.handlers.insert(name.to_string(), Box::new(handler));
        Ok(())
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    /// Run the command named by `args[0]` with the remaining arguments.
    pub fn dispatch(&self, ctx: &CommandContext, args: &[String]) -> Result<()> {
        let Some((name, rest)) = args.split_first() else {
            return Err(CliError::UnknownCommand(String::new()));
        };
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| CliError::UnknownCommand(name.clone()))?;
        tracing::debug!(command = %name, "Dispatching registered command");
        handler(ctx, rest)
    }
}
