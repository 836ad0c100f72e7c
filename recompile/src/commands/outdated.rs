//! `outdated`: the items to recompile for a set of change events.

use super::{CommandContext, read_json};
use crate::error::Result;
use colored::Colorize;
use convenient_deps::{
    ChangeEvent, ChecksumStore, DetectedChanges, GraphBaseline, ItemId, Outdatedness,
    OutdatednessReason, load_baseline, propagate_baseline, save_graph,
};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

/// Accepted shapes of the `--changes` file: the output of `recompile detect`,
/// or a bare list of events.
#[derive(Deserialize)]
#[serde(untagged)]
enum ChangesFile {
    Events(Vec<ChangeEvent>),
    Detected(DetectedChanges),
}

impl From<ChangesFile> for DetectedChanges {
    fn from(file: ChangesFile) -> Self {
        match file {
            ChangesFile::Events(events) => DetectedChanges {
                events,
                removed: BTreeSet::new(),
            },
            ChangesFile::Detected(detected) => detected,
        }
    }
}

/// Propagate `events` over the persisted graph.
///
/// Falls back to a full rebuild of every known item when the graph cannot
/// be loaded. Known items are those in the graph plus those with stored
/// checksums.
///
/// Items in `removed` are left out of the result. Their edges are dropped
/// from the persisted graph only after propagation, so their dependents are
/// still reached.
pub fn compute(
    ctx: &CommandContext,
    events: &[ChangeEvent],
    removed: &BTreeSet<ItemId>,
) -> Result<Outdatedness> {
    let baseline = load_baseline(&ctx.config.graph_file);

    let mut known: BTreeSet<ItemId> = ChecksumStore::load(&ctx.config.checksum_file)?
        .items()
        .cloned()
        .collect();
    if let Some(store) = baseline.store() {
        known.extend(store.items().into_iter().cloned());
    }

    let mut outdated = propagate_baseline(
        &baseline,
        events,
        known,
        ctx.config.propagation_options(),
    );
    if removed.is_empty() {
        return Ok(outdated);
    }

    let _ = outdated.exclude(removed);
    if let GraphBaseline::Loaded(mut store) = baseline {
        let pruned: usize = removed.iter().map(|item| store.remove_item(item)).sum();
        if pruned > 0 {
            save_graph(&store, &ctx.config.graph_file)?;
            info!(items = removed.len(), edges = pruned, "Pruned removed items");
        }
    }
    Ok(outdated)
}

pub fn execute(ctx: &CommandContext, changes: &Path, json: bool) -> Result<()> {
    let changes: DetectedChanges = read_json::<ChangesFile>(changes)?.into();
    let outdated = compute(ctx, &changes.events, &changes.removed)?;

    if json {
        let items: Vec<&ItemId> = outdated.items().collect();
        println!("{}", serde_json::to_string_pretty(&items).unwrap_or_default());
        return Ok(());
    }

    for (item, reason) in outdated.iter() {
        let reason = match reason {
            OutdatednessReason::Changed { .. } => reason.to_string().yellow(),
            OutdatednessReason::Dependency { .. } => reason.to_string().normal(),
            OutdatednessReason::FullRebuild => reason.to_string().red(),
        };
        println!("{}  {reason}", item.as_str().bold());
    }
    println!();
    println!("{} items outdated", outdated.len());
    Ok(())
}
