//! File-backed log backend rooted at a local directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::embedded::EmbeddedStore;
use crate::error::{StoreError, StoreResult};
use crate::store::{Log, Store};

/// A named log stored as a single append-only file under a directory.
///
/// The file holds one mutation record per put/delete; opening the store
/// replays the file to rebuild the key space, so data survives close
/// and reopen of the same log name in the same directory.
pub struct FileLog {
    dir: PathBuf,
    name: String,
}

impl FileLog {
    /// Creates a handle for the named log under `dir`.
    ///
    /// No I/O happens until [`Log::open_store`] is called.
    #[must_use]
    pub fn new(dir: &Path, name: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            name: name.to_string(),
        }
    }

    /// Returns the path of the backing log file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.name))
    }
}

impl Log for FileLog {
    fn name(&self) -> &str {
        &self.name
    }

    fn open_store(&self, create_if_missing: bool) -> StoreResult<Arc<dyn Store>> {
        let path = self.path();
        if !path.exists() {
            if !create_if_missing {
                return Err(StoreError::LogNotFound {
                    name: self.name.clone(),
                });
            }
            std::fs::create_dir_all(&self.dir)?;
        }

        let store = EmbeddedStore::open_file(&path)?;
        Ok(Arc::new(store) as Arc<dyn Store>)
    }
}
