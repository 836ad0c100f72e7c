//! Incremental build simulation across several runs.
//!
//! A small site is "compiled" repeatedly. Each run:
//! 1. loads the previous dependency graph and checksums
//! 2. detects changes by checksum
//! 3. propagates outdatedness
//! 4. recompiles the outdated items, re-recording their dependencies
//! 5. persists graph and checksums for the next run

use convenient_deps::{
    ChecksumStore, DependencyProps, DependencyStore, FacetState, GraphBaseline, ItemId,
    ItemSnapshot, PropagationOptions, load_baseline, propagate_baseline, save_graph,
};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

struct Site {
    posts: BTreeMap<String, (String, String)>, // id -> (title, body)
}

impl Site {
    fn new() -> Self {
        let mut posts = BTreeMap::new();
        let _ = posts.insert("/posts/a.md".to_string(), ("Alpha".to_string(), "first".to_string()));
        let _ = posts.insert("/posts/b.md".to_string(), ("Beta".to_string(), "second".to_string()));
        Self { posts }
    }

    fn snapshots(&self) -> BTreeMap<ItemId, ItemSnapshot> {
        let mut items = BTreeMap::new();
        for (id, (title, body)) in &self.posts {
            let _ = items.insert(
                ItemId::from(id.as_str()),
                ItemSnapshot {
                    raw_content: body.clone(),
                    attributes: BTreeMap::from([("title".to_string(), json!(title))]),
                    compiled_content: Some(format!("<h1>{title}</h1><p>{body}</p>")),
                    path: Some(id.replace(".md", ".html")),
                },
            );
        }
        let titles: Vec<_> = self.posts.values().map(|(t, _)| t.clone()).collect();
        let _ = items.insert(
            ItemId::from("/index.html"),
            ItemSnapshot {
                raw_content: "<ul>{{ posts }}</ul>".to_string(),
                compiled_content: Some(titles.join(",")),
                path: Some("/index.html".to_string()),
                ..Default::default()
            },
        );
        let _ = items.insert(
            ItemId::from("/feed.xml"),
            ItemSnapshot {
                raw_content: "<feed/>".to_string(),
                path: Some("/feed.xml".to_string()),
                ..Default::default()
            },
        );
        let _ = items.insert(
            ItemId::from("/about.md"),
            ItemSnapshot {
                raw_content: "about".to_string(),
                ..Default::default()
            },
        );
        items
    }

    /// Record what compiling `item` reads.
    fn compile(&self, item: &ItemId, store: &mut DependencyStore) {
        match item.as_str() {
            "/index.html" => {
                for post in self.posts.keys() {
                    store.record(
                        item.clone(),
                        post.as_str(),
                        &DependencyProps::new()
                            .with_attributes(FacetState::partial(["title"]))
                            .with_path(true),
                    );
                }
            }
            "/feed.xml" => {
                for post in self.posts.keys() {
                    store.record(
                        item.clone(),
                        post.as_str(),
                        &DependencyProps::new().with_compiled_content(true),
                    );
                }
            }
            _ => {}
        }
    }
}

struct Workspace {
    _dir: tempfile::TempDir,
    graph: PathBuf,
    checksums: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let graph = dir.path().join("deps.json");
        let checksums = dir.path().join("checksums.json");
        Self {
            _dir: dir,
            graph,
            checksums,
        }
    }
}

/// One compilation run. Returns the items that were recompiled.
fn run(site: &Site, ws: &Workspace) -> BTreeSet<String> {
    let snapshots = site.snapshots();
    let previous = ChecksumStore::load(&ws.checksums).unwrap();
    let detected = previous.detect_changes(&snapshots);

    let baseline = load_baseline(&ws.graph);
    let outdated = propagate_baseline(
        &baseline,
        &detected.events,
        snapshots.keys().cloned(),
        PropagationOptions::default(),
    );

    let mut store = match baseline {
        GraphBaseline::Loaded(store) => store,
        GraphBaseline::Unavailable(_) => DependencyStore::new(),
    };
    for removed in &detected.removed {
        let _ = store.remove_item(removed);
    }

    let mut compiled = BTreeSet::new();
    for item in outdated.items() {
        if detected.removed.contains(item) {
            continue;
        }
        site.compile(item, &mut store);
        let _ = compiled.insert(item.to_string());
    }

    save_graph(&store, &ws.graph).unwrap();
    ChecksumStore::from_snapshots(&snapshots).save(&ws.checksums).unwrap();
    compiled
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[test]
fn test_first_run_compiles_everything() {
    let site = Site::new();
    let ws = Workspace::new();
    let compiled = run(&site, &ws);
    assert_eq!(
        compiled,
        set(&["/about.md", "/feed.xml", "/index.html", "/posts/a.md", "/posts/b.md"])
    );
}

#[test]
fn test_unchanged_site_compiles_nothing() {
    let site = Site::new();
    let ws = Workspace::new();
    let _ = run(&site, &ws);
    assert!(run(&site, &ws).is_empty());
}

#[test]
fn test_body_change_skips_title_only_dependents() {
    let mut site = Site::new();
    let ws = Workspace::new();
    let _ = run(&site, &ws);

    site.posts.get_mut("/posts/a.md").unwrap().1 = "rewritten".to_string();
    let compiled = run(&site, &ws);

    assert_eq!(compiled, set(&["/feed.xml", "/posts/a.md"]));
}

#[test]
fn test_title_change_reaches_index() {
    let mut site = Site::new();
    let ws = Workspace::new();
    let _ = run(&site, &ws);

    site.posts.get_mut("/posts/b.md").unwrap().0 = "Beta, revised".to_string();
    let compiled = run(&site, &ws);

    assert_eq!(compiled, set(&["/feed.xml", "/index.html", "/posts/b.md"]));
}

#[test]
fn test_removed_item_invalidates_dependents() {
    let mut site = Site::new();
    let ws = Workspace::new();
    let _ = run(&site, &ws);

    let _ = site.posts.remove("/posts/b.md");
    let compiled = run(&site, &ws);

    assert_eq!(compiled, set(&["/feed.xml", "/index.html"]));

    let store = convenient_deps::load_graph(&ws.graph).unwrap();
    assert!(!store.contains_item(&ItemId::from("/posts/b.md")));
}

#[test]
fn test_corrupt_graph_triggers_full_rebuild() {
    let mut site = Site::new();
    let ws = Workspace::new();
    let _ = run(&site, &ws);

    corrupt(&ws.graph);
    site.posts.get_mut("/posts/a.md").unwrap().1 = "rewritten".to_string();
    let compiled = run(&site, &ws);

    assert_eq!(compiled.len(), 5);

    // The rebuilt graph is usable again on the next run.
    assert!(run(&site, &ws).is_empty());
}

fn corrupt(path: &Path) {
    let json = fs::read_to_string(path).unwrap();
    let tampered = json.replacen("\"path\": true", "\"path\": false", 1);
    assert_ne!(json, tampered);
    fs::write(path, tampered).unwrap();
}
