//! `dot`: GraphViz export, registered as an extension command.

use super::CommandContext;
use crate::error::{CliError, Result};
use crate::registry::CommandRegistry;
use convenient_deps::DependencyStore;

/// Render the graph in DOT. Edges point from source to dependent and are
/// labelled with the compact descriptor form.
pub fn render(store: &DependencyStore) -> String {
    let mut out = String::from("digraph Dependencies {\n  rankdir=LR;\n");
    for item in store.items() {
        out.push_str(&format!("  \"{}\";\n", escape(item.as_str())));
    }
    for (dependent, source, props) in store.edges() {
        out.push_str(&format!(
            "  \"{}\" -> \"{}\" [label=\"{props}\"];\n",
            escape(source.as_str()),
            escape(dependent.as_str()),
        ));
    }
    out.push_str("}\n");
    out
}

fn escape(id: &str) -> String {
    id.replace('\\', "\\\\").replace('"', "\\\"")
}

pub fn register(registry: &mut CommandRegistry) -> Result<()> {
    registry.register("dot", |ctx: &CommandContext, args: &[String]| {
        if let Some(extra) = args.first() {
            return Err(CliError::UnknownCommand(format!("dot {extra}")));
        }
        print!("{}", render(&ctx.load_store()?));
        Ok(())
    })
}
