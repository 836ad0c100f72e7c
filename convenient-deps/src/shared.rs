//! Recording dependencies from parallel rule evaluation.

use crate::{DependencyProps, DependencyStore, ItemId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A [`DependencyStore`] that many threads can record into.
///
/// All writers go through one lock, so concurrent observations of the same
/// pair are applied one after the other. Merge order does not affect the
/// result.
#[derive(Debug, Clone, Default)]
pub struct SharedDependencyStore {
    inner: Arc<Mutex<DependencyStore>>,
}

impl SharedDependencyStore {
    /// Wrap an existing store, e.g. the previous run's graph.
    #[must_use]
    pub fn new(store: DependencyStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    // A panic in another recorder cannot leave an edge half-merged: `record`
    // replaces the descriptor in one assignment.
    fn lock(&self) -> MutexGuard<'_, DependencyStore> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a reliance of `dependent` on `source`.
    pub fn record(
        &self,
        dependent: impl Into<ItemId>,
        source: impl Into<ItemId>,
        props: &DependencyProps,
    ) {
        self.lock().record(dependent, source, props);
    }

    /// Forget every edge of `id`. Returns the number of edges removed.
    pub fn remove_item(&self, id: &ItemId) -> usize {
        self.lock().remove_item(id)
    }

    /// Number of edges recorded so far.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.lock().edge_count()
    }

    /// Copy of the current store.
    #[must_use]
    pub fn snapshot(&self) -> DependencyStore {
        self.lock().clone()
    }

    /// Take the store out for propagation or persistence.
    ///
    /// Clones the store if other handles are still alive.
    #[must_use]
    pub fn into_store(self) -> DependencyStore {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(PoisonError::into_inner),
            Err(inner) => Self { inner }.snapshot(),
        }
    }
}
