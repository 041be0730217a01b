//! Diagnostic observers for resolution traceability.
//!
//! Observers hook into the container's construction pipeline for structured
//! logging and timing without pulling a logging framework into the crate.
//! Events fire around factory executions only; cache hits (an already built
//! singleton or scoped instance) are silent.

use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::key::Key;

/// Observer of construction events.
///
/// Implementations receive an event when a factory is about to run, when it
/// produced an instance, and when it failed. Calls are made synchronously on
/// the resolving thread, so keep implementations lightweight.
///
/// # Examples
///
/// ```rust
/// use ingot_di::{Container, Definition, DiObserver, Key};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct CountingObserver {
///     constructions: AtomicUsize,
/// }
///
/// impl DiObserver for CountingObserver {
///     fn resolving(&self, _key: &Key) {}
///
///     fn resolved(&self, _key: &Key, _duration: Duration) {
///         self.constructions.fetch_add(1, Ordering::Relaxed);
///     }
/// }
///
/// struct Service;
///
/// let observer = Arc::new(CountingObserver::default());
/// let container = Container::new();
/// container.add_observer(observer.clone());
/// container.register(Definition::singleton(|_| Service)).unwrap();
///
/// container.resolve::<Service>().unwrap();
/// container.resolve::<Service>().unwrap(); // cache hit, no event
///
/// assert_eq!(observer.constructions.load(Ordering::Relaxed), 1);
/// ```
pub trait DiObserver: Send + Sync {
    /// Called immediately before a factory runs for `key`.
    fn resolving(&self, key: &Key);

    /// Called after a factory produced an instance for `key`.
    ///
    /// `duration` covers the factory execution including nested
    /// constructions it triggered.
    fn resolved(&self, key: &Key, duration: Duration);

    /// Called when a factory run for `key` ended in an error.
    ///
    /// The error still propagates to the caller after this hook.
    fn resolution_failed(&self, _key: &Key, _error: &DiError) {}
}

/// Registered observers with near-zero cost when empty.
#[derive(Default)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, key: &Key) {
        for observer in &self.observers {
            observer.resolving(key);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, key: &Key, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(key, duration);
        }
    }

    #[inline]
    pub(crate) fn resolution_failed(&self, key: &Key, error: &DiError) {
        for observer in &self.observers {
            observer.resolution_failed(key, error);
        }
    }
}

/// Built-in observer that logs construction events to standard streams.
///
/// Useful during development. Production systems usually implement
/// [`DiObserver`] against their own logging infrastructure instead.
///
/// # Examples
///
/// ```rust
/// use ingot_di::{Container, Definition, LoggingObserver};
/// use std::sync::Arc;
///
/// struct Service;
///
/// let container = Container::new();
/// container.add_observer(Arc::new(LoggingObserver::with_prefix("[app-di]")));
/// container.register(Definition::singleton(|_| Service)).unwrap();
/// container.resolve::<Service>().unwrap();
/// ```
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    /// Creates a logging observer with the default prefix.
    pub fn new() -> Self {
        Self {
            prefix: "[ingot-di]".to_string(),
        }
    }

    /// Creates a logging observer with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for LoggingObserver {
    fn resolving(&self, key: &Key) {
        println!("{} Constructing: {}", self.prefix, key.display_name());
    }

    fn resolved(&self, key: &Key, duration: Duration) {
        println!(
            "{} Constructed: {} in {:?}",
            self.prefix,
            key.display_name(),
            duration
        );
    }

    fn resolution_failed(&self, key: &Key, error: &DiError) {
        eprintln!(
            "{} FAILED constructing {}: {}",
            self.prefix,
            key.display_name(),
            error
        );
    }
}

/// Built-in observer that aggregates construction metrics.
///
/// Tracks construction counts, cumulative factory time, and failures for
/// post-run analysis.
pub struct MetricsObserver {
    constructions: std::sync::atomic::AtomicU64,
    total_time_ns: std::sync::atomic::AtomicU64,
    failures: std::sync::atomic::AtomicU64,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self {
            constructions: std::sync::atomic::AtomicU64::new(0),
            total_time_ns: std::sync::atomic::AtomicU64::new(0),
            failures: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Number of successful factory executions observed.
    pub fn constructions(&self) -> u64 {
        self.constructions.load(std::sync::atomic::Ordering::Relaxed)
    }

    /// Cumulative factory time across all observed constructions.
    pub fn total_time(&self) -> Duration {
        Duration::from_nanos(self.total_time_ns.load(std::sync::atomic::Ordering::Relaxed))
    }

    /// Number of failed factory executions observed.
    pub fn failures(&self) -> u64 {
        self.failures.load(std::sync::atomic::Ordering::Relaxed)
    }
}

impl Default for MetricsObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for MetricsObserver {
    fn resolving(&self, _key: &Key) {}

    fn resolved(&self, _key: &Key, duration: Duration) {
        self.constructions
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        self.total_time_ns.fetch_add(
            duration.as_nanos() as u64,
            std::sync::atomic::Ordering::Relaxed,
        );
    }

    fn resolution_failed(&self, _key: &Key, _error: &DiError) {
        self.failures
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_observer_aggregates() {
        let observer = MetricsObserver::new();
        let key = Key::of::<String>();

        assert_eq!(observer.constructions(), 0);
        observer.resolved(&key, Duration::from_millis(10));
        observer.resolved(&key, Duration::from_millis(20));
        assert_eq!(observer.constructions(), 2);
        assert!(observer.total_time() >= Duration::from_millis(30));

        observer.resolution_failed(&key, &DiError::Duplicate("x"));
        assert_eq!(observer.failures(), 1);
    }

    #[test]
    fn test_fan_out_reaches_every_observer() {
        let mut observers = Observers::new();
        assert!(!observers.has_observers());

        let a = Arc::new(MetricsObserver::new());
        let b = Arc::new(MetricsObserver::new());
        observers.add(a.clone());
        observers.add(b.clone());
        assert!(observers.has_observers());

        let key = Key::of::<u32>();
        observers.resolving(&key);
        observers.resolved(&key, Duration::from_micros(5));

        assert_eq!(a.constructions(), 1);
        assert_eq!(b.constructions(), 1);
    }
}
