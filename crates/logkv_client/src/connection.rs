//! Shared store connection lifecycle.
//!
//! All clients in a process share one connection to the underlying
//! store. The first acquirer opens the log and store; later acquirers
//! reuse the handle and bump a reference count; the last release tears
//! everything down. The whole open/close sequence runs under a single
//! mutex so the store is opened exactly once and closed exactly once
//! even when many workers race.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use logkv_store::{open_log, Log, Store};

use crate::config::Config;
use crate::error::ClientResult;
use crate::reporter::StatsReporter;
use crate::stats::ClientStats;

/// Open-connection state: the handles plus the user count.
struct Shared {
    /// Keeps the log alive for as long as the store is open.
    _log: Box<dyn Log>,
    store: Arc<dyn Store>,
    stats: Arc<ClientStats>,
    reporter: Option<StatsReporter>,
    refs: usize,
}

/// Manages the single shared store connection.
///
/// The manager is an explicit object rather than static state; the
/// harness owns one and hands an `Arc` of it to each worker.
#[derive(Default)]
pub struct ConnectionManager {
    state: Mutex<Option<Shared>>,
}

impl ConnectionManager {
    /// Creates a manager with no open connection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the shared connection, opening it on first use.
    ///
    /// If a connection is already open, the config is ignored and the
    /// existing handle is reused. Otherwise the named log and store are
    /// opened and, if a stats interval is configured, the background
    /// reporter is started.
    ///
    /// # Errors
    ///
    /// Any failure opening the log or store propagates to the caller
    /// and leaves the manager closed, so a later `acquire` can retry.
    pub fn acquire(self: &Arc<Self>, config: &Config) -> ClientResult<Connection> {
        let mut state = self.state.lock();

        if let Some(shared) = state.as_mut() {
            shared.refs += 1;
            debug!(log = %config.log_name, refs = shared.refs, "reusing store connection");
            return Ok(Connection {
                manager: Arc::clone(self),
                store: Arc::clone(&shared.store),
                stats: Arc::clone(&shared.stats),
            });
        }

        info!(log = %config.log_name, backend = ?config.backend, "opening store connection");
        let log = open_log(&config.backend, &config.log_name)?;
        let store = log.open_store(config.create_if_missing)?;

        let stats = Arc::new(ClientStats::new());
        let reporter = config
            .effective_stats_interval()
            .map(|interval| StatsReporter::start(Arc::clone(&stats), interval));

        let connection = Connection {
            manager: Arc::clone(self),
            store: Arc::clone(&store),
            stats: Arc::clone(&stats),
        };
        *state = Some(Shared {
            _log: log,
            store,
            stats,
            reporter,
            refs: 1,
        });
        Ok(connection)
    }

    /// Returns true if a connection is currently open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.lock().is_some()
    }

    /// Returns the number of handles currently holding the connection.
    #[must_use]
    pub fn ref_count(&self) -> usize {
        self.state.lock().as_ref().map_or(0, |shared| shared.refs)
    }

    /// Drops one reference; tears the connection down at zero.
    fn release(&self) {
        let mut state = self.state.lock();
        let refs = match state.as_mut() {
            Some(shared) => {
                shared.refs -= 1;
                shared.refs
            }
            None => return,
        };
        if refs > 0 {
            return;
        }

        info!("closing store connection");
        if let Some(mut shared) = state.take() {
            if let Some(mut reporter) = shared.reporter.take() {
                reporter.stop();
            }
            // Store and log handles are disposed here, in that order.
            drop(shared);
        }
    }
}

/// A reference-counted handle to the shared connection.
///
/// Dropping the handle releases it; the last drop closes the store.
pub struct Connection {
    manager: Arc<ConnectionManager>,
    store: Arc<dyn Store>,
    stats: Arc<ClientStats>,
}

impl Connection {
    /// Returns the shared store handle.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Returns the stats shared by all holders of this connection.
    #[must_use]
    pub fn stats(&self) -> &ClientStats {
        &self.stats
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.manager.release();
    }
}
