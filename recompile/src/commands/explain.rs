//! `explain`: the recorded dependencies of one item.

use super::{CommandContext, describe_partials};
use crate::error::Result;
use colored::Colorize;
use convenient_deps::{DependencyProps, DependencyStore, ItemId};

/// Lines describing `item`'s edges in both directions.
pub fn describe(store: &DependencyStore, item: &ItemId, arrow: &str) -> Vec<String> {
    let line = |other: &ItemId, props: &DependencyProps| {
        let partials = describe_partials(props);
        if partials.is_empty() {
            format!("  {arrow} {other}  {}", props.inspect())
        } else {
            format!("  {arrow} {other}  {}  {partials}", props.inspect())
        }
    };

    let mut lines = Vec::new();
    let predecessors = store.predecessors(item);
    if !predecessors.is_empty() {
        lines.push(format!("{item} depends on:"));
        lines.extend(predecessors.into_iter().map(|(source, props)| line(source, props)));
    }
    let successors = store.successors(item);
    if !successors.is_empty() {
        lines.push(format!("{item} is needed by:"));
        lines.extend(successors.into_iter().map(|(dependent, props)| line(dependent, props)));
    }
    lines
}

pub fn execute(ctx: &CommandContext, item: &str) -> Result<()> {
    let store = ctx.load_store()?;
    let item = ItemId::from(item);
    let lines = describe(&store, &item, ctx.caps.arrow());

    if lines.is_empty() {
        println!("{}", format!("No dependencies recorded for {item}").dimmed());
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}
