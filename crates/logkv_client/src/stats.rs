//! Operation counters shared across client instances.

use std::sync::atomic::{AtomicU64, Ordering};

/// Operation statistics for one shared connection.
///
/// All counters are atomic and monotonically increasing; they can be
/// read while operations are in progress.
#[derive(Debug, Default)]
pub struct ClientStats {
    reads: AtomicU64,
    scans: AtomicU64,
    inserts: AtomicU64,
    updates: AtomicU64,
    deletes: AtomicU64,
    not_found: AtomicU64,
    errors: AtomicU64,
}

impl ClientStats {
    /// Creates a new stats instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scan(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_update(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the total number of read operations.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the total number of scan operations.
    pub fn scans(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    /// Returns the total number of insert operations.
    pub fn inserts(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }

    /// Returns the total number of update operations.
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    /// Returns the total number of delete operations.
    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    /// Returns the total number of not-found results.
    pub fn not_found(&self) -> u64 {
        self.not_found.load(Ordering::Relaxed)
    }

    /// Returns the total number of operations that failed.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Returns the total number of operations issued.
    pub fn operations(&self) -> u64 {
        self.reads() + self.scans() + self.inserts() + self.updates() + self.deletes()
    }

    /// Returns a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            reads: self.reads(),
            scans: self.scans(),
            inserts: self.inserts(),
            updates: self.updates(),
            deletes: self.deletes(),
            not_found: self.not_found(),
            errors: self.errors(),
        }
    }
}

/// A point-in-time snapshot of client statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Total read operations.
    pub reads: u64,
    /// Total scan operations.
    pub scans: u64,
    /// Total insert operations.
    pub inserts: u64,
    /// Total update operations.
    pub updates: u64,
    /// Total delete operations.
    pub deletes: u64,
    /// Total not-found results.
    pub not_found: u64,
    /// Total failed operations.
    pub errors: u64,
}
