//! `detect`: change events from item snapshots.

use super::{CommandContext, read_json};
use crate::error::Result;
use convenient_deps::{ChecksumStore, DetectedChanges, ItemId, ItemSnapshot};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Compare `snapshots` with the stored checksums. With `write`, the new
/// checksums replace the old ones.
///
/// The graph is left alone: removed items keep their edges until
/// `outdated` has propagated their removal to their dependents.
pub fn detect(
    ctx: &CommandContext,
    snapshots: &BTreeMap<ItemId, ItemSnapshot>,
    write: bool,
) -> Result<DetectedChanges> {
    let previous = ChecksumStore::load(&ctx.config.checksum_file)?;
    let detected = previous.detect_changes(snapshots);

    if write {
        ChecksumStore::from_snapshots(snapshots).save(&ctx.config.checksum_file)?;
        info!(
            items = snapshots.len(),
            removed = detected.removed.len(),
            "Stored checksums"
        );
    }
    Ok(detected)
}

/// Print the events and removed items as JSON, ready for
/// `recompile outdated --changes`.
pub fn execute(ctx: &CommandContext, snapshots: &Path, write: bool) -> Result<()> {
    let snapshots: BTreeMap<ItemId, ItemSnapshot> = read_json(snapshots)?;
    let detected = detect(ctx, &snapshots, write)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&detected).unwrap_or_default()
    );
    Ok(())
}
