//! In-memory endpoint registry.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::Endpoint;

/// Keyed store of endpoints.
///
/// Endpoints are stored behind `Arc` and never mutated; registering an id
/// again replaces the previous entry wholesale.
#[derive(Debug, Default)]
pub struct Registry {
    inner: RwLock<HashMap<String, Arc<Endpoint>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an endpoint, overwriting any entry with the same id.
    pub fn register(&self, endpoint: Endpoint) {
        self.write().insert(endpoint.id.clone(), Arc::new(endpoint));
    }

    /// Remove an endpoint, returning it if it was registered.
    pub fn unregister(&self, id: &str) -> Option<Arc<Endpoint>> {
        self.write().remove(id)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Endpoint>> {
        self.read().get(id).cloned()
    }

    /// All endpoints, sorted by id.
    pub fn get_all(&self) -> Vec<Arc<Endpoint>> {
        let mut endpoints: Vec<_> = self.read().values().cloned().collect();
        endpoints.sort_by(|a, b| a.id.cmp(&b.id));
        endpoints
    }

    /// Endpoints whose category matches exactly, sorted by id.
    pub fn get_by_category(&self, category: &str) -> Vec<Arc<Endpoint>> {
        let mut endpoints: Vec<_> = self
            .read()
            .values()
            .filter(|e| e.category == category)
            .cloned()
            .collect();
        endpoints.sort_by(|a, b| a.id.cmp(&b.id));
        endpoints
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn count(&self) -> usize {
        self.read().len()
    }

    /// Swap in a complete new set of endpoints under one write lock.
    ///
    /// Readers observe either the old or the new content. Later entries win
    /// on duplicate ids, same as repeated [`Registry::register`] calls.
    pub fn replace_all(&self, endpoints: impl IntoIterator<Item = Endpoint>) {
        let fresh: HashMap<_, _> = endpoints
            .into_iter()
            .map(|e| (e.id.clone(), Arc::new(e)))
            .collect();
        *self.write() = fresh;
    }

    // A panic while holding the lock cannot leave the map half-updated, so a
    // poisoned lock is safe to keep using.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Endpoint>>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Endpoint>>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
