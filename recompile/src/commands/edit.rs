//! Commands that change the graph: `record` and `forget`.

use super::CommandContext;
use crate::error::Result;
use convenient_deps::{DependencyProps, DepsError, ItemId};
use tracing::info;

/// Merge a reliance of `dependent` on `source` into the graph.
pub fn record(ctx: &CommandContext, dependent: &str, source: &str, props_json: &str) -> Result<()> {
    let config: serde_json::Value = serde_json::from_str(props_json)
        .map_err(|e| DepsError::InvalidDescriptor(format!("{props_json}: {e}")))?;
    let props = DependencyProps::from_config(&config)?;

    let mut store = ctx.load_store()?;
    store.record(dependent, source, &props);
    ctx.save_store(&store)?;

    let merged = store
        .props(&ItemId::from(dependent), &ItemId::from(source))
        .map(DependencyProps::inspect)
        .unwrap_or_default();
    println!("{dependent} {} {source}  {merged}", ctx.caps.arrow());
    Ok(())
}

/// Remove every edge of `item`.
pub fn forget(ctx: &CommandContext, item: &str) -> Result<()> {
    let mut store = ctx.load_store()?;
    let removed = store.remove_item(&ItemId::from(item));
    if removed > 0 {
        ctx.save_store(&store)?;
    }
    info!(%item, removed, "Forgot item");
    println!("Removed {removed} dependencies of {item}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use convenient_deps::FacetState;

    #[test]
    fn test_record_merges_into_persisted_graph() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = CommandContext::in_dir(dir.path());

        record(&ctx, "/index.html", "/a.md", r#"{"attributes": ["title"]}"#).unwrap();
        record(&ctx, "/index.html", "/a.md", r#"{"attributes": ["date"], "path": true}"#).unwrap();

        let store = ctx.load_store().unwrap();
        assert_eq!(store.edge_count(), 1);
        let props = store
            .props(&ItemId::from("/index.html"), &ItemId::from("/a.md"))
            .unwrap();
        assert_eq!(props.attributes(), &FacetState::partial(["date", "title"]));
        assert!(props.path_active());
    }

    #[test]
    fn test_record_rejects_bad_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = CommandContext::in_dir(dir.path());

        for bad in ["{", r#"{"colour": true}"#] {
            assert!(matches!(
                record(&ctx, "b", "a", bad),
                Err(CliError::Deps(DepsError::InvalidDescriptor(_)))
            ));
        }
        assert!(!ctx.config.graph_file.exists());
    }

    #[test]
    fn test_forget() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = CommandContext::in_dir(dir.path());
        record(&ctx, "b", "a", r#"{"compiled_content": true}"#).unwrap();
        record(&ctx, "c", "b", r#"{"compiled_content": true}"#).unwrap();

        forget(&ctx, "b").unwrap();
        assert!(ctx.load_store().unwrap().is_empty());
    }
}
