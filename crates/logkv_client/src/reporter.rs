//! Background best-effort stats reporter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::info;

use crate::stats::ClientStats;

/// A background thread that periodically logs a status line with the
/// current operation counters.
///
/// Reporting is best-effort and never affects operation outcomes.
/// Cancellation is cooperative: [`stop`](Self::stop) sets a shared flag,
/// wakes the thread, and joins it, so no report is emitted after stop
/// returns.
pub struct StatsReporter {
    stop: Arc<(Mutex<bool>, Condvar)>,
    reports: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl StatsReporter {
    /// Starts a reporter that wakes every `interval`.
    #[must_use]
    pub fn start(stats: Arc<ClientStats>, interval: Duration) -> Self {
        let stop = Arc::new((Mutex::new(false), Condvar::new()));
        let reports = Arc::new(AtomicU64::new(0));
        let thread_stop = Arc::clone(&stop);
        let thread_reports = Arc::clone(&reports);

        let handle = std::thread::spawn(move || {
            let (lock, condvar) = &*thread_stop;
            let mut stopped = lock.lock();
            while !*stopped {
                let timed_out = condvar
                    .wait_for(&mut stopped, interval)
                    .timed_out();
                if *stopped {
                    break;
                }
                if timed_out {
                    let snap = stats.snapshot();
                    info!(
                        reads = snap.reads,
                        scans = snap.scans,
                        inserts = snap.inserts,
                        updates = snap.updates,
                        deletes = snap.deletes,
                        not_found = snap.not_found,
                        errors = snap.errors,
                        "status"
                    );
                    thread_reports.fetch_add(1, Ordering::Relaxed);
                }
            }
        });

        Self {
            stop,
            reports,
            handle: Some(handle),
        }
    }

    /// Returns the number of status lines emitted so far.
    ///
    /// Once [`stop`](Self::stop) has returned, this count is final.
    #[must_use]
    pub fn reports_emitted(&self) -> u64 {
        self.reports.load(Ordering::Relaxed)
    }

    /// Signals the reporter to stop and joins the thread.
    pub fn stop(&mut self) {
        let (lock, condvar) = &*self.stop;
        {
            let mut stopped = lock.lock();
            *stopped = true;
            condvar.notify_all();
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StatsReporter {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_joins_the_thread() {
        let stats = Arc::new(ClientStats::new());
        let mut reporter = StatsReporter::start(stats, Duration::from_millis(5));

        std::thread::sleep(Duration::from_millis(20));
        reporter.stop();
        assert!(reporter.handle.is_none());
    }

    #[test]
    fn stop_is_idempotent() {
        let stats = Arc::new(ClientStats::new());
        let mut reporter = StatsReporter::start(stats, Duration::from_secs(60));

        reporter.stop();
        reporter.stop();
    }

    #[test]
    fn no_reports_land_after_stop() {
        let stats = Arc::new(ClientStats::new());
        let mut reporter = StatsReporter::start(stats, Duration::from_millis(5));

        std::thread::sleep(Duration::from_millis(50));
        reporter.stop();
        let emitted = reporter.reports_emitted();
        assert!(emitted > 0);

        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(reporter.reports_emitted(), emitted);
    }

    #[test]
    fn stop_returns_promptly_with_long_interval() {
        let stats = Arc::new(ClientStats::new());
        let mut reporter = StatsReporter::start(stats, Duration::from_secs(3600));

        let started = std::time::Instant::now();
        reporter.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
