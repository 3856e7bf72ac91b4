//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use book_corner_core::{DefinitionLookup, Library};
use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    /// The one owned store. Holding the lock serializes all mutations.
    pub library: Mutex<Library>,
    pub lookup: DefinitionLookup,
    /// Books with a definition lookup currently in flight.
    pending_lookups: StdMutex<HashSet<String>>,
}

impl AppState {
    pub fn new(library: Library, lookup: DefinitionLookup) -> Arc<Self> {
        Arc::new(Self {
            library: Mutex::new(library),
            lookup,
            pending_lookups: StdMutex::new(HashSet::new()),
        })
    }

    /// Marks a lookup as running for `book_id`. Returns `None` if one already is.
    /// The mark is cleared when the returned guard is dropped.
    pub fn begin_lookup(&self, book_id: &str) -> Option<LookupGuard<'_>> {
        let mut pending = self
            .pending_lookups
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !pending.insert(book_id.to_string()) {
            return None;
        }
        Some(LookupGuard {
            pending: &self.pending_lookups,
            book_id: book_id.to_string(),
        })
    }

    pub fn lookup_in_flight(&self, book_id: &str) -> bool {
        self.pending_lookups
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(book_id)
    }
}

//=========================================================================================
// LookupGuard
//=========================================================================================

pub struct LookupGuard<'a> {
    pending: &'a StdMutex<HashSet<String>>,
    book_id: String,
}

impl Drop for LookupGuard<'_> {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.book_id);
    }
}
