//! Client configuration.

use std::time::Duration;

use logkv_store::Backend;

/// Configuration for acquiring a store connection.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend serving the log.
    pub backend: Backend,

    /// Name of the log to open or create.
    pub log_name: String,

    /// Whether to create the log if it doesn't exist.
    pub create_if_missing: bool,

    /// Interval between background stats report lines
    /// (`None` or zero disables reporting).
    pub stats_interval: Option<Duration>,
}

impl Config {
    /// Creates a configuration for the given backend and log name.
    #[must_use]
    pub fn new(backend: Backend, log_name: &str) -> Self {
        Self {
            backend,
            log_name: log_name.to_string(),
            create_if_missing: true,
            stats_interval: None,
        }
    }

    /// Sets whether to create the log if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets the stats reporting interval.
    #[must_use]
    pub const fn stats_interval(mut self, interval: Duration) -> Self {
        self.stats_interval = Some(interval);
        self
    }

    /// Returns the effective reporting interval, treating zero as
    /// disabled.
    #[must_use]
    pub fn effective_stats_interval(&self) -> Option<Duration> {
        self.stats_interval.filter(|d| !d.is_zero())
    }
}
