//! Fine-grained dependency tracking for incremental recompilation.
//!
//! This crate decides which items of a static site (or any other set of
//! compiled documents) must be recompiled after a change. It provides:
//! - [`DependencyProps`]: which facets of a source item a dependent relies
//!   on (`raw_content`, `attributes`, `compiled_content`, `path`), possibly
//!   restricted to specific attribute names or content patterns
//! - [`DependencyStore`]: one merged descriptor per (dependent, source) pair
//! - [`OutdatednessPropagator`]: turns change events into the set of
//!   outdated items, skipping edges the change cannot affect
//! - Persistence of the graph between runs, with a full-rebuild fallback
//! - Checksum-based change detection
//!
//! # Example
//!
//! ```
//! use convenient_deps::{
//!     ChangeEvent, DependencyProps, DependencyStore, Facet, FacetChange, FacetState, ItemId,
//!     OutdatednessPropagator,
//! };
//!
//! let mut store = DependencyStore::new();
//!
//! // The index page shows the post's title and links to its output path.
//! store.record(
//!     "/index.html",
//!     "/posts/hello.md",
//!     &DependencyProps::new()
//!         .with_attributes(FacetState::partial(["title"]))
//!         .with_path(true),
//! );
//!
//! // Only the post's `tags` attribute changed.
//! let events = [ChangeEvent::new("/posts/hello.md")
//!     .with(FacetChange::partial(Facet::Attributes, ["tags"]))];
//!
//! let outdated = OutdatednessPropagator::new(&store).propagate(&events);
//! assert!(outdated.contains(&ItemId::from("/posts/hello.md")));
//! assert!(!outdated.contains(&ItemId::from("/index.html")));
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(unused_results)]

mod change;
mod checksum;
mod error;
mod facet;
mod persist;
mod propagate;
mod props;
mod shared;
mod store;

pub use change::{ChangeEvent, FacetChange};
pub use checksum::{ChecksumStore, DetectedChanges, ItemChecksums, ItemSnapshot};
pub use error::{DepsError, DepsResult};
pub use facet::Facet;
pub use persist::{
    FORMAT_VERSION, GraphBaseline, PersistedGraph, load_baseline, load_graph, save_graph,
};
pub use propagate::{
    Outdatedness, OutdatednessPropagator, OutdatednessReason, PropagationOptions,
    propagate_baseline,
};
pub use props::{DependencyProps, FacetState};
pub use shared::SharedDependencyStore;
pub use store::{DependencyStore, ItemId};
