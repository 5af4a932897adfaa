use std::sync::{Arc, RwLock};

use crate::db::CardName;

#[derive(Default)]
struct IndexState {
    names: Arc<Vec<CardName>>,
    loaded: bool,
}

/// In-memory copy of the card cache keyspace used by fuzzy search.
///
/// This is a read-through cache of the store, never a source of truth. A
/// refresh builds the full replacement first and swaps it in under the write
/// lock, so readers see either the old or the new list and nothing in
/// between.
#[derive(Default)]
pub struct NameIndex {
    state: RwLock<IndexState>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current names. The returned list is immutable; later refreshes do not
    /// affect it.
    pub fn snapshot(&self) -> Arc<Vec<CardName>> {
        let guard = match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(&guard.names)
    }

    pub fn replace(&self, names: Vec<CardName>) -> usize {
        let names = Arc::new(names);
        let count = names.len();
        let mut guard = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.names = names;
        guard.loaded = true;
        count
    }

    /// Whether the index has been filled from the store at least once.
    pub fn is_loaded(&self) -> bool {
        match self.state.read() {
            Ok(guard) => guard.loaded,
            Err(poisoned) => poisoned.into_inner().loaded,
        }
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
