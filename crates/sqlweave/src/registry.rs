//! Named executors with current/default selection and per-connection counters.
//!
//! ```ignore
//! let mut registry = ConnectionRegistry::with_config(
//!     RegistryConfig::new().with_slow_query_threshold(Duration::from_millis(250)),
//! );
//! registry.add("primary", primary);
//! registry.add("replica", replica);
//!
//! registry.use_connection("replica")?;
//! let rows = qb::select("products").get(&registry).await?;
//! println!("{:?}", registry.stats("replica")?);
//! ```

use crate::client::Executor;
use crate::error::{WeaveError, WeaveResult};
use crate::qb::{Param, SQL_LOG_TARGET};
use crate::row::Row;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Configuration for registry timing and timeouts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Calls slower than this are logged at WARN. `None` disables the check.
    pub slow_query_threshold: Option<Duration>,
    /// Per-call limit; a call running longer is dropped. `None` waits forever.
    pub query_timeout: Option<Duration>,
}

impl RegistryConfig {
    /// No slow-query log and no timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the slow query threshold.
    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    /// Set the query timeout duration.
    ///
    /// Calls exceeding this duration are dropped and return [`WeaveError::Timeout`].
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }
}

/// Snapshot of one connection's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Calls made through the registry, failed ones included.
    pub queries: u64,
    /// Calls that returned an error (timeouts included).
    pub failed: u64,
    /// Total execution time.
    pub total_duration: Duration,
    /// Slowest call.
    pub max_duration: Duration,
}

#[derive(Debug, Default)]
struct Counters {
    queries: AtomicU64,
    failed: AtomicU64,
    total_duration_nanos: AtomicU64,
    max_duration_nanos: AtomicU64,
}

impl Counters {
    fn record(&self, duration: Duration, failed: bool) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.queries.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        let prev = self.total_duration_nanos.fetch_add(nanos, Ordering::Relaxed);
        if prev.checked_add(nanos).is_none() {
            self.total_duration_nanos.store(u64::MAX, Ordering::Relaxed);
        }
        self.max_duration_nanos.fetch_max(nanos, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ConnectionStats {
        ConnectionStats {
            queries: self.queries.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            total_duration: Duration::from_nanos(self.total_duration_nanos.load(Ordering::Relaxed)),
            max_duration: Duration::from_nanos(self.max_duration_nanos.load(Ordering::Relaxed)),
        }
    }

    fn reset(&self) {
        self.queries.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.total_duration_nanos.store(0, Ordering::Relaxed);
        self.max_duration_nanos.store(0, Ordering::Relaxed);
    }
}

#[derive(Debug)]
struct Entry<E> {
    name: String,
    executor: E,
    counters: Counters,
}

/// A directory of named executors.
///
/// The first connection added becomes both the default and the current one.
/// The registry itself implements [`Executor`] by delegating to the current
/// connection, so builders run against it directly. Switching connections needs
/// `&mut self`; share a registry across tasks only behind your own lock.
#[derive(Debug)]
pub struct ConnectionRegistry<E> {
    entries: Vec<Entry<E>>,
    default: Option<usize>,
    current: Option<usize>,
    config: RegistryConfig,
}

impl<E> Default for ConnectionRegistry<E> {
    fn default() -> Self {
        Self::with_config(RegistryConfig::default())
    }
}

impl<E> ConnectionRegistry<E> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with timing settings.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            entries: Vec::new(),
            default: None,
            current: None,
            config,
        }
    }

    /// Registry settings.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn position(&self, name: &str) -> WeaveResult<usize> {
        self.entries
            .iter()
            .position(|entry| entry.name == name)
            .ok_or_else(|| WeaveError::UnknownConnection(name.to_string()))
    }

    /// Register `executor` under `name`, replacing (and resetting) an existing entry.
    pub fn add(&mut self, name: impl Into<String>, executor: E) {
        let name = name.into();
        let entry = Entry {
            name,
            executor,
            counters: Counters::default(),
        };
        match self.position(&entry.name) {
            Ok(idx) => self.entries[idx] = entry,
            Err(_) => {
                self.entries.push(entry);
                let idx = self.entries.len() - 1;
                self.default.get_or_insert(idx);
                self.current.get_or_insert(idx);
            }
        }
    }

    /// Make `name` the default connection.
    pub fn set_default(&mut self, name: &str) -> WeaveResult<()> {
        self.default = Some(self.position(name)?);
        Ok(())
    }

    /// Make `name` the current connection.
    pub fn use_connection(&mut self, name: &str) -> WeaveResult<()> {
        self.current = Some(self.position(name)?);
        Ok(())
    }

    /// Switch the current connection back to the default one.
    pub fn use_default(&mut self) {
        self.current = self.default;
    }

    /// Name of the current connection.
    pub fn current_name(&self) -> Option<&str> {
        self.current.map(|idx| self.entries[idx].name.as_str())
    }

    /// Name of the default connection.
    pub fn default_name(&self) -> Option<&str> {
        self.default.map(|idx| self.entries[idx].name.as_str())
    }

    /// Executor registered under `name`.
    pub fn get(&self, name: &str) -> Option<&E> {
        self.position(name)
            .ok()
            .map(|idx| &self.entries[idx].executor)
    }

    /// Registered names, in the order they were added.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no connection is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counters of the connection registered under `name`.
    pub fn stats(&self, name: &str) -> WeaveResult<ConnectionStats> {
        let idx = self.position(name)?;
        Ok(self.entries[idx].counters.snapshot())
    }

    /// Reset the counters of every connection.
    pub fn reset_stats(&self) {
        for entry in &self.entries {
            entry.counters.reset();
        }
    }

    fn current_entry(&self) -> WeaveResult<&Entry<E>> {
        self.current
            .map(|idx| &self.entries[idx])
            .ok_or_else(|| WeaveError::UnknownConnection("<none registered>".to_string()))
    }

    async fn timed<T, F>(&self, entry: &Entry<E>, sql: &str, future: F) -> WeaveResult<T>
    where
        F: Future<Output = WeaveResult<T>> + Send,
    {
        let start = Instant::now();
        let result = match self.config.query_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, future).await {
                Ok(result) => result,
                Err(_) => Err(WeaveError::Timeout(timeout)),
            },
            None => future.await,
        };
        let duration = start.elapsed();

        entry.counters.record(duration, result.is_err());

        if let Err(err) = &result {
            tracing::warn!(
                target: SQL_LOG_TARGET,
                connection = %entry.name,
                duration_ms = duration.as_millis() as u64,
                error = %err,
                sql = %sql,
                "query failed"
            );
        } else if self
            .config
            .slow_query_threshold
            .is_some_and(|threshold| duration >= threshold)
        {
            tracing::warn!(
                target: SQL_LOG_TARGET,
                connection = %entry.name,
                duration_ms = duration.as_millis() as u64,
                sql = %sql,
                "slow query"
            );
        }
        result
    }
}

impl<E: Executor> Executor for ConnectionRegistry<E> {
    fn fetch(
        &self,
        sql: &str,
        params: &[Param],
    ) -> impl Future<Output = WeaveResult<Vec<Row>>> + Send {
        async move {
            let entry = self.current_entry()?;
            self.timed(entry, sql, entry.executor.fetch(sql, params)).await
        }
    }

    fn execute(
        &self,
        sql: &str,
        params: &[Param],
    ) -> impl Future<Output = WeaveResult<u64>> + Send {
        async move {
            let entry = self.current_entry()?;
            self.timed(entry, sql, entry.executor.execute(sql, params)).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_added_is_default_and_current() {
        let mut registry = ConnectionRegistry::new();
        assert!(registry.current_name().is_none());
        registry.add("primary", 1u8);
        registry.add("replica", 2u8);
        assert_eq!(registry.default_name(), Some("primary"));
        assert_eq!(registry.current_name(), Some("primary"));
        assert_eq!(registry.names(), vec!["primary", "replica"]);
        assert_eq!(registry.get("replica"), Some(&2));
    }

    #[test]
    fn switching_connections() {
        let mut registry = ConnectionRegistry::new();
        registry.add("primary", ());
        registry.add("replica", ());
        registry.use_connection("replica").unwrap();
        assert_eq!(registry.current_name(), Some("replica"));
        registry.use_default();
        assert_eq!(registry.current_name(), Some("primary"));
        registry.set_default("replica").unwrap();
        registry.use_default();
        assert_eq!(registry.current_name(), Some("replica"));
        assert!(matches!(
            registry.use_connection("missing"),
            Err(WeaveError::UnknownConnection(_))
        ));
    }

    #[test]
    fn counters_accumulate_and_reset() {
        let counters = Counters::default();
        counters.record(Duration::from_millis(5), false);
        counters.record(Duration::from_millis(20), true);
        let stats = counters.snapshot();
        assert_eq!(stats.queries, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.total_duration, Duration::from_millis(25));
        assert_eq!(stats.max_duration, Duration::from_millis(20));
        counters.reset();
        assert_eq!(counters.snapshot(), ConnectionStats::default());
    }
}
