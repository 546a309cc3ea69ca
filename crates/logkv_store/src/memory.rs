//! In-memory log backend for testing and ephemeral runs.

use std::sync::Arc;

use crate::embedded::EmbeddedStore;
use crate::error::StoreResult;
use crate::store::{Log, Store};

/// An ephemeral named log held entirely in memory.
///
/// Every store opened from the same handle shares one key space; the
/// data is discarded when the handle is dropped. Opening a new
/// `MemoryLog` with a previously used name yields a fresh empty log.
pub struct MemoryLog {
    name: String,
    store: Arc<EmbeddedStore>,
}

impl MemoryLog {
    /// Creates a new empty in-memory log.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            store: Arc::new(EmbeddedStore::new()),
        }
    }
}

impl Log for MemoryLog {
    fn name(&self) -> &str {
        &self.name
    }

    fn open_store(&self, _create_if_missing: bool) -> StoreResult<Arc<dyn Store>> {
        Ok(Arc::clone(&self.store) as Arc<dyn Store>)
    }
}
