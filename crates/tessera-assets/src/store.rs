use std::sync::Arc;

use crate::handle::Handle;

/// Append-only arena of shared, immutable entries.
///
/// Entries are reference counted so that drawables and cache records can
/// share the same mesh or texture blob without copying it.
pub struct Store<T> {
    entries: Vec<Arc<T>>,
}

impl<T> Store<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry; its handle stays valid for the store's lifetime.
    pub fn push(&mut self, value: T) -> Handle<T> {
        self.entries.push(Arc::new(value));
        Handle::new(self.entries.len() - 1)
    }

    /// Look up a handle that may come from elsewhere.
    pub fn get(&self, handle: Handle<T>) -> Option<&Arc<T>> {
        self.entries.get(handle.index())
    }

    /// Look up a handle that a cache record holds.
    ///
    /// # Panics
    ///
    /// Panics if the handle does not resolve. Records only ever hold handles
    /// issued by this store, so a miss means the append-only contract broke.
    pub fn resolve(&self, handle: Handle<T>) -> &Arc<T> {
        self.entries
            .get(handle.index())
            .unwrap_or_else(|| panic!("store corruption: {handle:?} of {} entries", self.entries.len()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}
