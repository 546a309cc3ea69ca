//! CRUD operations over the shared store connection.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use crate::config::Config;
use crate::connection::{Connection, ConnectionManager};
use crate::error::{ClientError, ClientResult};
use crate::key::composite_key;
use crate::record::{decode_record, encode_record, FieldMap};

/// Tri-state result of a CRUD operation.
///
/// Store-level failures never escape an operation: they are caught at
/// the operation boundary, logged, and reported as [`Outcome::Error`].
/// `NotFound` is reserved for a missing row on read and update.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T> {
    /// The operation succeeded.
    Ok(T),
    /// The targeted row does not exist.
    NotFound,
    /// The operation failed; details were logged.
    Error,
}

impl<T> Outcome<T> {
    /// Returns true if the operation succeeded.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Returns the success value, if any.
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok(value) => Some(value),
            _ => None,
        }
    }
}

/// A benchmark client bound to the shared store connection.
///
/// Each worker owns one `Client`; all clients created from the same
/// [`ConnectionManager`] share a single underlying store. Call
/// [`init`](Self::init) before issuing operations and
/// [`shutdown`](Self::shutdown) when done.
pub struct Client {
    manager: Arc<ConnectionManager>,
    config: Config,
    connection: Option<Connection>,
}

impl Client {
    /// Creates a client; no connection is opened until `init`.
    #[must_use]
    pub fn new(manager: Arc<ConnectionManager>, config: Config) -> Self {
        Self {
            manager,
            config,
            connection: None,
        }
    }

    /// Acquires the shared connection, opening the store on first use.
    ///
    /// # Errors
    ///
    /// Propagates any failure opening the log or store. The manager is
    /// left closed so a later `init` can retry.
    pub fn init(&mut self) -> ClientResult<()> {
        if self.connection.is_none() {
            self.connection = Some(self.manager.acquire(&self.config)?);
        }
        Ok(())
    }

    /// Releases this client's hold on the shared connection.
    ///
    /// The store is torn down when the last client shuts down.
    pub fn shutdown(&mut self) {
        self.connection = None;
    }

    /// Reads one row, optionally projected to `fields`.
    pub fn read(
        &self,
        table: &str,
        key: &str,
        fields: Option<&HashSet<String>>,
    ) -> Outcome<FieldMap> {
        if let Some(connection) = &self.connection {
            connection.stats().record_read();
        }
        self.settle("read", self.try_read(table, key, fields))
    }

    /// Scans forward from `start_key`, returning up to `record_count`
    /// rows in key order, each optionally projected to `fields`.
    pub fn scan(
        &self,
        table: &str,
        start_key: &str,
        record_count: usize,
        fields: Option<&HashSet<String>>,
    ) -> Outcome<Vec<FieldMap>> {
        if let Some(connection) = &self.connection {
            connection.stats().record_scan();
        }
        self.settle("scan", self.try_scan(table, start_key, record_count, fields))
    }

    /// Writes a full row at the composite key, overwriting any
    /// existing row.
    pub fn insert(&self, table: &str, key: &str, values: &FieldMap) -> Outcome<()> {
        if let Some(connection) = &self.connection {
            connection.stats().record_insert();
        }
        self.settle("insert", self.try_insert(table, key, values))
    }

    /// Merges `delta` into an existing row inside a transaction.
    ///
    /// Fields named in `delta` replace their existing values; all other
    /// fields are preserved. Returns [`Outcome::NotFound`] without
    /// writing if the row does not exist.
    pub fn update(&self, table: &str, key: &str, delta: &FieldMap) -> Outcome<()> {
        if let Some(connection) = &self.connection {
            connection.stats().record_update();
        }
        self.settle("update", self.try_update(table, key, delta))
    }

    /// Deletes the row at the composite key. Deleting an absent row
    /// is OK.
    pub fn delete(&self, table: &str, key: &str) -> Outcome<()> {
        if let Some(connection) = &self.connection {
            connection.stats().record_delete();
        }
        self.settle("delete", self.try_delete(table, key))
    }

    /// Returns the stats shared by all holders of the connection.
    #[must_use]
    pub fn stats(&self) -> Option<&crate::stats::ClientStats> {
        self.connection.as_ref().map(Connection::stats)
    }

    fn connection(&self) -> ClientResult<&Connection> {
        self.connection.as_ref().ok_or(ClientError::NotInitialized)
    }

    /// Maps an operation result onto the tri-state surface, logging
    /// and counting failures at the boundary.
    fn settle<T>(&self, op: &'static str, result: ClientResult<Outcome<T>>) -> Outcome<T> {
        let stats = self.connection.as_ref().map(Connection::stats);
        match result {
            Ok(Outcome::NotFound) => {
                if let Some(stats) = stats {
                    stats.record_not_found();
                }
                Outcome::NotFound
            }
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(op, error = %err, "operation failed");
                if let Some(stats) = stats {
                    stats.record_error();
                }
                Outcome::Error
            }
        }
    }

    fn try_read(
        &self,
        table: &str,
        key: &str,
        fields: Option<&HashSet<String>>,
    ) -> ClientResult<Outcome<FieldMap>> {
        let connection = self.connection()?;
        let composite = composite_key(table, key);

        let Some(blob) = connection.store().get(&composite)? else {
            return Ok(Outcome::NotFound);
        };
        Ok(Outcome::Ok(decode_record(&blob, fields)?))
    }

    fn try_scan(
        &self,
        table: &str,
        start_key: &str,
        record_count: usize,
        fields: Option<&HashSet<String>>,
    ) -> ClientResult<Outcome<Vec<FieldMap>>> {
        let connection = self.connection()?;

        // The iterator is released on every exit path when the box
        // drops, including decode errors below.
        let mut it = connection.store().iter()?;
        it.seek(&composite_key(table, start_key));

        let mut rows = Vec::new();
        while rows.len() < record_count {
            let Some((_, blob)) = it.entry() else {
                break;
            };
            rows.push(decode_record(blob, fields)?);
            it.advance();
        }
        Ok(Outcome::Ok(rows))
    }

    fn try_insert(&self, table: &str, key: &str, values: &FieldMap) -> ClientResult<Outcome<()>> {
        let connection = self.connection()?;
        let composite = composite_key(table, key);
        let blob = encode_record(values);

        connection.store().put(&composite, &blob)?;
        Ok(Outcome::Ok(()))
    }

    fn try_update(&self, table: &str, key: &str, delta: &FieldMap) -> ClientResult<Outcome<()>> {
        let connection = self.connection()?;
        let composite = composite_key(table, key);

        // The transaction is disposed exactly once when the box drops,
        // whether we commit, abort, or bail out on an error.
        let mut txn = connection.store().begin()?;

        let Some(blob) = txn.get(&composite)? else {
            txn.abort();
            return Ok(Outcome::NotFound);
        };

        let mut row = decode_record(&blob, None)?;
        for (name, value) in delta {
            row.insert(name.clone(), value.clone());
        }
        txn.put(&composite, &encode_record(&row))?;
        txn.commit()?;
        Ok(Outcome::Ok(()))
    }

    fn try_delete(&self, table: &str, key: &str) -> ClientResult<Outcome<()>> {
        let connection = self.connection()?;
        connection.store().delete(&composite_key(table, key))?;
        Ok(Outcome::Ok(()))
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("log_name", &self.config.log_name)
            .field("initialized", &self.connection.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logkv_store::Backend;

    fn memory_client(log_name: &str) -> Client {
        let manager = Arc::new(ConnectionManager::new());
        let mut client = Client::new(manager, Config::new(Backend::Memory, log_name));
        client.init().unwrap();
        client
    }

    fn row(value: &str) -> FieldMap {
        [("field-0".to_string(), value.as_bytes().to_vec())]
            .into_iter()
            .collect()
    }

    #[test]
    fn operations_before_init_report_error() {
        let manager = Arc::new(ConnectionManager::new());
        let client = Client::new(manager, Config::new(Backend::Memory, "uninit"));

        assert_eq!(client.read("t", "k", None), Outcome::Error);
        assert_eq!(client.insert("t", "k", &row("v")), Outcome::Error);
        assert_eq!(client.delete("t", "k"), Outcome::Error);
    }

    #[test]
    fn operations_after_shutdown_report_error() {
        let mut client = memory_client("shutdown");
        assert!(client.insert("t", "k", &row("v")).is_ok());

        client.shutdown();
        assert_eq!(client.read("t", "k", None), Outcome::Error);
    }

    #[test]
    fn init_is_idempotent() {
        let mut client = memory_client("idempotent");
        client.init().unwrap();
        assert_eq!(client.manager.ref_count(), 1);
    }

    #[test]
    fn read_after_insert() {
        let client = memory_client("rw");
        let values = row("value");

        assert!(client.insert("table", "key", &values).is_ok());
        assert_eq!(client.read("table", "key", None), Outcome::Ok(values));
    }

    #[test]
    fn stats_count_outcomes() {
        let client = memory_client("stats");

        assert!(client.insert("t", "k", &row("v")).is_ok());
        let _ = client.read("t", "k", None);
        let _ = client.read("t", "missing", None);

        let stats = client.stats().unwrap();
        assert_eq!(stats.inserts(), 1);
        assert_eq!(stats.reads(), 2);
        assert_eq!(stats.not_found(), 1);
        assert_eq!(stats.errors(), 0);
    }
}
