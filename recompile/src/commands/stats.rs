//! `stats` and `cycles`.

use super::CommandContext;
use crate::error::Result;
use colored::Colorize;
use convenient_deps::{DependencyStore, Facet};
use std::collections::BTreeMap;

/// Summary numbers for a graph.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub items: usize,
    pub edges: usize,
    pub cycles: usize,
    /// Edges relying on each facet.
    pub by_facet: BTreeMap<Facet, usize>,
    /// Edges whose reliance on some facet is partial.
    pub partial_edges: usize,
}

impl GraphStats {
    pub fn of(store: &DependencyStore) -> Self {
        let mut stats = GraphStats {
            items: store.item_count(),
            edges: store.edge_count(),
            cycles: store.find_cycles().len(),
            ..Default::default()
        };
        for (_, _, props) in store.edges() {
            for facet in props.active() {
                *stats.by_facet.entry(facet).or_insert(0) += 1;
            }
            if props.raw_content().identifiers().is_some() || props.attributes().identifiers().is_some() {
                stats.partial_edges += 1;
            }
        }
        stats
    }
}

pub fn stats(ctx: &CommandContext) -> Result<()> {
    let stats = GraphStats::of(&ctx.load_store()?);

    println!("{}", "Dependency graph".bold());
    println!("  Items:          {}", stats.items);
    println!("  Edges:          {}", stats.edges);
    println!("  Partial edges:  {}", stats.partial_edges);
    println!("  Cycles:         {}", stats.cycles);
    for facet in Facet::ALL {
        let count = stats.by_facet.get(&facet).copied().unwrap_or(0);
        println!("  {:<16}{count}", format!("{facet}:"));
    }
    Ok(())
}

pub fn cycles(ctx: &CommandContext) -> Result<()> {
    let store = ctx.load_store()?;
    let cycles = store.find_cycles();

    if cycles.is_empty() {
        println!("No cycles");
        return Ok(());
    }
    let separator = format!(" {} ", ctx.caps.arrow());
    for cycle in &cycles {
        let names: Vec<&str> = cycle.iter().map(|id| id.as_str()).collect();
        println!("  {}", names.join(&separator));
    }
    println!();
    println!("{} cycles (allowed; listed for diagnostics)", cycles.len());
    Ok(())
}
