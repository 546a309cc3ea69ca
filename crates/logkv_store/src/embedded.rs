//! Embedded store shared by the memory and local file backends.
//!
//! The embedded store keeps the full key space in an ordered map. The
//! file backend additionally appends every mutation to a log file and
//! replays it on open, so a log reopened from the same directory sees
//! prior data.

use std::collections::{BTreeMap, HashMap};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use bytes::{Buf, BufMut};
use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::error::{StoreError, StoreResult};
use crate::store::{Store, StoreIterator, StoreTransaction};

/// Log record op codes.
const OP_PUT: u8 = 1;
const OP_DELETE: u8 = 2;

/// An embedded byte-key/byte-value store.
///
/// Keys are held in a `BTreeMap` guarded by a `RwLock`, giving
/// lexicographic iteration order. Transactions serialize through a
/// single-writer lock held for the transaction's lifetime, which makes
/// each read-check-write sequence atomic with respect to other
/// transactions.
pub struct EmbeddedStore {
    map: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    log_file: Option<Mutex<File>>,
    txn_lock: Mutex<()>,
}

impl EmbeddedStore {
    /// Creates a new empty in-memory store with no backing file.
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: RwLock::new(BTreeMap::new()),
            log_file: None,
            txn_lock: Mutex::new(()),
        }
    }

    /// Opens a file-backed store, replaying any existing log records.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or its contents do
    /// not parse as a sequence of log records.
    pub fn open_file(path: &Path) -> StoreResult<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        let map = replay(&contents)?;

        Ok(Self {
            map: RwLock::new(map),
            log_file: Some(Mutex::new(file)),
            txn_lock: Mutex::new(()),
        })
    }

    /// Returns the number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    /// Returns true if the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }

    /// Appends a record to the log file, if one is attached.
    ///
    /// Callers must hold the map write lock so replay order matches the
    /// order mutations became visible.
    fn log_record(&self, op: u8, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let Some(ref file) = self.log_file else {
            return Ok(());
        };
        let mut buf = Vec::with_capacity(1 + 8 + key.len() + value.len());
        encode_record(&mut buf, op, key, value);
        let mut file = file.lock();
        file.write_all(&buf)?;
        Ok(())
    }

    /// Appends a batch of put records to the log file in one write, if
    /// one is attached.
    ///
    /// The batch lands in a single `write_all`, so a failed write never
    /// leaves some of the batch in the log. Callers must hold the map
    /// write lock, as with [`log_record`](Self::log_record).
    fn log_batch(&self, writes: &HashMap<Vec<u8>, Vec<u8>>) -> StoreResult<()> {
        let Some(ref file) = self.log_file else {
            return Ok(());
        };
        let mut buf = Vec::new();
        for (key, value) in writes {
            encode_record(&mut buf, OP_PUT, key, value);
        }
        let mut file = file.lock();
        file.write_all(&buf)?;
        Ok(())
    }
}

fn encode_record(buf: &mut Vec<u8>, op: u8, key: &[u8], value: &[u8]) {
    buf.put_u8(op);
    buf.put_u32_le(key.len() as u32);
    buf.put_slice(key);
    if op == OP_PUT {
        buf.put_u32_le(value.len() as u32);
        buf.put_slice(value);
    }
}

impl Default for EmbeddedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for EmbeddedStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.map.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let mut map = self.map.write();
        self.log_record(OP_PUT, key, value)?;
        map.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        let mut map = self.map.write();
        self.log_record(OP_DELETE, key, &[])?;
        map.remove(key);
        Ok(())
    }

    fn iter<'a>(&'a self) -> StoreResult<Box<dyn StoreIterator + 'a>> {
        Ok(Box::new(EmbeddedIterator {
            store: self,
            entries: Vec::new(),
            pos: 0,
            seeked: false,
        }))
    }

    fn begin<'a>(&'a self) -> StoreResult<Box<dyn StoreTransaction + 'a>> {
        let guard = self.txn_lock.lock();
        Ok(Box::new(EmbeddedTransaction {
            store: self,
            _write: guard,
            writes: HashMap::new(),
            open: true,
        }))
    }
}

/// Rebuilds the key map from log file contents.
fn replay(contents: &[u8]) -> StoreResult<BTreeMap<Vec<u8>, Vec<u8>>> {
    let mut map = BTreeMap::new();
    let mut buf = contents;

    while buf.has_remaining() {
        if buf.remaining() < 5 {
            return Err(StoreError::Corrupted(
                "truncated record header".to_string(),
            ));
        }
        let op = buf.get_u8();
        let key_len = buf.get_u32_le() as usize;
        if buf.remaining() < key_len {
            return Err(StoreError::Corrupted("truncated key".to_string()));
        }
        let key = buf[..key_len].to_vec();
        buf.advance(key_len);

        match op {
            OP_PUT => {
                if buf.remaining() < 4 {
                    return Err(StoreError::Corrupted(
                        "truncated value length".to_string(),
                    ));
                }
                let value_len = buf.get_u32_le() as usize;
                if buf.remaining() < value_len {
                    return Err(StoreError::Corrupted("truncated value".to_string()));
                }
                let value = buf[..value_len].to_vec();
                buf.advance(value_len);
                map.insert(key, value);
            }
            OP_DELETE => {
                map.remove(&key);
            }
            other => {
                return Err(StoreError::Corrupted(format!(
                    "unknown record op {other}"
                )));
            }
        }
    }

    Ok(map)
}

/// Iterator over a snapshot of the key space tail.
struct EmbeddedIterator<'a> {
    store: &'a EmbeddedStore,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    pos: usize,
    seeked: bool,
}

impl StoreIterator for EmbeddedIterator<'_> {
    fn seek(&mut self, key: &[u8]) {
        let map = self.store.map.read();
        self.entries = map
            .range(key.to_vec()..)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        self.pos = 0;
        self.seeked = true;
    }

    fn entry(&self) -> Option<(&[u8], &[u8])> {
        if !self.seeked {
            return None;
        }
        self.entries
            .get(self.pos)
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    fn advance(&mut self) {
        if self.seeked && self.pos < self.entries.len() {
            self.pos += 1;
        }
    }
}

/// A single-writer transaction over the embedded store.
///
/// Holds the store's transaction lock for its whole lifetime. Writes
/// are buffered and applied on commit; dropping without commit discards
/// them.
struct EmbeddedTransaction<'a> {
    store: &'a EmbeddedStore,
    _write: MutexGuard<'a, ()>,
    writes: HashMap<Vec<u8>, Vec<u8>>,
    open: bool,
}

impl EmbeddedTransaction<'_> {
    fn ensure_open(&self) -> StoreResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(StoreError::TransactionClosed)
        }
    }
}

impl StoreTransaction for EmbeddedTransaction<'_> {
    fn get(&mut self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.ensure_open()?;
        if let Some(value) = self.writes.get(key) {
            return Ok(Some(value.clone()));
        }
        Ok(self.store.map.read().get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.ensure_open()?;
        self.writes.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        self.ensure_open()?;
        // Closed before any effect, so a failed commit cannot be
        // retried against a partially written log.
        self.open = false;

        let mut map = self.store.map.write();
        self.store.log_batch(&self.writes)?;
        for (key, value) in &self.writes {
            map.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn abort(&mut self) {
        self.writes.clear();
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn put_get_delete() {
        let store = EmbeddedStore::new();
        store.put(b"key", b"value").unwrap();
        assert_eq!(store.get(b"key").unwrap(), Some(b"value".to_vec()));

        store.delete(b"key").unwrap();
        assert_eq!(store.get(b"key").unwrap(), None);
    }

    #[test]
    fn put_overwrites() {
        let store = EmbeddedStore::new();
        store.put(b"key", b"old").unwrap();
        store.put(b"key", b"new").unwrap();
        assert_eq!(store.get(b"key").unwrap(), Some(b"new".to_vec()));
    }

    #[test]
    fn delete_missing_key_is_ok() {
        let store = EmbeddedStore::new();
        assert!(store.delete(b"missing").is_ok());
    }

    #[test]
    fn iterator_visits_keys_in_order() {
        let store = EmbeddedStore::new();
        store.put(b"c", b"3").unwrap();
        store.put(b"a", b"1").unwrap();
        store.put(b"b", b"2").unwrap();

        let mut it = store.iter().unwrap();
        it.seek(b"a");

        let mut keys = Vec::new();
        while let Some((k, _)) = it.entry() {
            keys.push(k.to_vec());
            it.advance();
        }
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn iterator_seeks_to_first_key_at_or_after() {
        let store = EmbeddedStore::new();
        store.put(b"a", b"1").unwrap();
        store.put(b"c", b"3").unwrap();

        let mut it = store.iter().unwrap();
        it.seek(b"b");
        assert_eq!(it.entry().map(|(k, _)| k.to_vec()), Some(b"c".to_vec()));
    }

    #[test]
    fn iterator_invalid_before_seek_and_past_end() {
        let store = EmbeddedStore::new();
        store.put(b"a", b"1").unwrap();

        let mut it = store.iter().unwrap();
        assert!(!it.valid());

        it.seek(b"a");
        assert!(it.valid());
        it.advance();
        assert!(!it.valid());
    }

    #[test]
    fn transaction_commit_applies_writes() {
        let store = EmbeddedStore::new();
        {
            let mut txn = store.begin().unwrap();
            txn.put(b"key", b"value").unwrap();
            txn.commit().unwrap();
        }
        assert_eq!(store.get(b"key").unwrap(), Some(b"value".to_vec()));
    }

    #[test]
    fn transaction_drop_discards_writes() {
        let store = EmbeddedStore::new();
        {
            let mut txn = store.begin().unwrap();
            txn.put(b"key", b"value").unwrap();
        }
        assert_eq!(store.get(b"key").unwrap(), None);
    }

    #[test]
    fn transaction_abort_discards_writes() {
        let store = EmbeddedStore::new();
        {
            let mut txn = store.begin().unwrap();
            txn.put(b"key", b"value").unwrap();
            txn.abort();
        }
        assert_eq!(store.get(b"key").unwrap(), None);
    }

    #[test]
    fn transaction_reads_own_writes() {
        let store = EmbeddedStore::new();
        store.put(b"key", b"old").unwrap();

        let mut txn = store.begin().unwrap();
        assert_eq!(txn.get(b"key").unwrap(), Some(b"old".to_vec()));

        txn.put(b"key", b"new").unwrap();
        assert_eq!(txn.get(b"key").unwrap(), Some(b"new".to_vec()));
    }

    #[test]
    fn closed_transaction_rejects_operations() {
        let store = EmbeddedStore::new();
        let mut txn = store.begin().unwrap();
        txn.commit().unwrap();

        assert!(matches!(
            txn.put(b"key", b"value"),
            Err(StoreError::TransactionClosed)
        ));
        assert!(matches!(txn.commit(), Err(StoreError::TransactionClosed)));
    }

    #[test]
    fn transactions_serialize_read_modify_write() {
        let store = Arc::new(EmbeddedStore::new());
        store.put(b"counter", &0u32.to_le_bytes()).unwrap();

        let mut handles = vec![];
        for _ in 0..4 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for _ in 0..25 {
                    let mut txn = store.begin().unwrap();
                    let bytes = txn.get(b"counter").unwrap().unwrap();
                    let current = u32::from_le_bytes(bytes.try_into().unwrap());
                    txn.put(b"counter", &(current + 1).to_le_bytes()).unwrap();
                    txn.commit().unwrap();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let bytes = store.get(b"counter").unwrap().unwrap();
        assert_eq!(u32::from_le_bytes(bytes.try_into().unwrap()), 100);
    }

    #[test]
    fn commit_logs_the_whole_batch_at_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.log");
        {
            let store = EmbeddedStore::open_file(&path).unwrap();
            let mut txn = store.begin().unwrap();
            txn.put(b"a", b"1").unwrap();
            txn.put(b"b", b"2").unwrap();
            txn.put(b"c", b"3").unwrap();
            txn.commit().unwrap();
        }

        let store = EmbeddedStore::open_file(&path).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(b"b").unwrap(), Some(b"2".to_vec()));
        assert_eq!(store.get(b"c").unwrap(), Some(b"3".to_vec()));
    }

    #[test]
    fn replay_rejects_truncated_records() {
        let mut contents = Vec::new();
        contents.put_u8(OP_PUT);
        contents.put_u32_le(100); // key length past end

        assert!(matches!(
            replay(&contents),
            Err(StoreError::Corrupted(_))
        ));
    }

    #[test]
    fn replay_applies_puts_and_deletes() {
        let mut contents = Vec::new();
        for (op, key, value) in [
            (OP_PUT, b"a".as_slice(), b"1".as_slice()),
            (OP_PUT, b"b", b"2"),
            (OP_DELETE, b"a", b""),
        ] {
            contents.put_u8(op);
            contents.put_u32_le(key.len() as u32);
            contents.put_slice(key);
            if op == OP_PUT {
                contents.put_u32_le(value.len() as u32);
                contents.put_slice(value);
            }
        }

        let map = replay(&contents).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(b"b".as_slice()), Some(&b"2".to_vec()));
    }
}
