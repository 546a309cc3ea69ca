//! Store interface traits and backend selection.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{StoreError, StoreResult};
use crate::file::FileLog;
use crate::memory::MemoryLog;

/// Backend selection for [`open_log`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Ephemeral in-memory backend. Data lives for the lifetime of the
    /// log handle and is shared by every store opened from it.
    Memory,

    /// File-backed backend rooted at a local directory. Each named log
    /// is one append-only file under `dir`.
    Local {
        /// Directory holding the log files.
        dir: PathBuf,
    },

    /// Remote/clustered backend: an object pool plus a sequencer
    /// endpoint. The engine serving this backend is external and not
    /// bundled with this crate.
    Cluster {
        /// Name of the storage pool.
        pool: String,
        /// Sequencer hostname.
        seq_host: String,
        /// Sequencer port.
        seq_port: u16,
    },
}

/// An opened named log.
///
/// A log is the unit of naming and placement; a [`Store`] is opened on
/// top of it. Dropping the handle releases the log.
pub trait Log: Send + Sync {
    /// Returns the log name.
    fn name(&self) -> &str;

    /// Opens the store materialized from this log.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::LogNotFound`] if the log has no existing
    /// data and `create_if_missing` is false, or an error if the log
    /// cannot be read.
    fn open_store(&self, create_if_missing: bool) -> StoreResult<Arc<dyn Store>>;
}

/// A byte-key/byte-value store.
///
/// # Invariants
///
/// - Keys are ordered lexicographically by their byte representation
/// - `get` returns exactly the bytes last `put` under that key
/// - Stores must be `Send + Sync` for concurrent access
pub trait Store: Send + Sync {
    /// Reads the value stored under `key`, if any.
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Writes `value` under `key`, overwriting any existing value.
    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Deletes `key`. Deleting an absent key is not an error.
    fn delete(&self, key: &[u8]) -> StoreResult<()>;

    /// Creates a new iterator over the key space.
    ///
    /// The iterator is positioned by [`StoreIterator::seek`] and is
    /// released when dropped.
    fn iter<'a>(&'a self) -> StoreResult<Box<dyn StoreIterator + 'a>>;

    /// Begins a new transaction.
    ///
    /// The transaction must be committed for its writes to become
    /// visible; dropping it without commit discards them.
    fn begin<'a>(&'a self) -> StoreResult<Box<dyn StoreTransaction + 'a>>;
}

/// A forward cursor over a store's key space.
///
/// Iterators observe a snapshot taken at [`seek`](Self::seek) time and
/// visit keys in lexicographic order.
pub trait StoreIterator {
    /// Positions the iterator at the first key `>= key`.
    fn seek(&mut self, key: &[u8]);

    /// Returns true if the iterator is positioned on an entry.
    fn valid(&self) -> bool {
        self.entry().is_some()
    }

    /// Returns the current key/value pair, or `None` if the iterator
    /// has not been seeked or has run off the end of the key space.
    fn entry(&self) -> Option<(&[u8], &[u8])>;

    /// Advances to the next entry.
    fn advance(&mut self);
}

/// A read-then-write transaction.
///
/// Reads within the transaction see the transaction's own pending
/// writes. The read-check-write sequence is atomic with respect to
/// other transactions on the same store. Dropping the transaction
/// releases it; uncommitted writes are discarded.
pub trait StoreTransaction {
    /// Reads the value under `key` as seen by this transaction.
    fn get(&mut self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Buffers a write of `value` under `key`.
    fn put(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Commits all buffered writes atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TransactionClosed`] if the transaction was
    /// already committed or aborted.
    fn commit(&mut self) -> StoreResult<()>;

    /// Aborts the transaction, discarding buffered writes.
    fn abort(&mut self);
}

/// Opens (or creates) the named log on the selected backend.
///
/// # Errors
///
/// Returns [`StoreError::UnsupportedBackend`] for the cluster backend,
/// which requires the external engine.
pub fn open_log(backend: &Backend, name: &str) -> StoreResult<Box<dyn Log>> {
    match backend {
        Backend::Memory => Ok(Box::new(MemoryLog::new(name))),
        Backend::Local { dir } => Ok(Box::new(FileLog::new(dir, name))),
        Backend::Cluster {
            pool,
            seq_host,
            seq_port,
        } => Err(StoreError::UnsupportedBackend {
            kind: format!("cluster pool {pool} via sequencer {seq_host}:{seq_port}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_memory_log() {
        let log = open_log(&Backend::Memory, "test-log").unwrap();
        assert_eq!(log.name(), "test-log");
    }

    #[test]
    fn open_cluster_log_is_unsupported() {
        let backend = Backend::Cluster {
            pool: "pool".to_string(),
            seq_host: "seq.example".to_string(),
            seq_port: 5678,
        };
        let result = open_log(&backend, "test-log");
        assert!(matches!(
            result,
            Err(StoreError::UnsupportedBackend { .. })
        ));
    }
}
