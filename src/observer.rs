//! Diagnostic observers for compilation and resolution events.
//!
//! Observers receive synchronous callbacks from the [`ServiceProvider`](crate::ServiceProvider)
//! when a factory is compiled, when compilation fails, and when a service
//! has been resolved. The provider skips all bookkeeping when no observer
//! is registered.

use std::sync::Arc;
use std::time::Duration;

use crate::compiler::CompiledFactory;
use crate::error::DiError;
use crate::key::Key;

/// Observer trait for container events.
///
/// Calls are made synchronously on the resolving thread. Keep
/// implementations lightweight.
///
/// # Examples
///
/// ```
/// use ferrous_factory::{CompiledFactory, Constructor, DiObserver, Injectable, Key, Resolver, ServiceCollection};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct CountingObserver {
///     compiled: AtomicUsize,
///     resolved: AtomicUsize,
/// }
///
/// impl DiObserver for CountingObserver {
///     fn compiled(&self, _key: &Key, _factory: &CompiledFactory, _elapsed: Duration) {
///         self.compiled.fetch_add(1, Ordering::SeqCst);
///     }
///
///     fn resolved(&self, _key: &Key, _elapsed: Duration) {
///         self.resolved.fetch_add(1, Ordering::SeqCst);
///     }
/// }
///
/// struct Clock;
/// impl Injectable for Clock {
///     fn constructors() -> Vec<Constructor> {
///         vec![Constructor::of::<Self>().build(|_| Ok(Clock))]
///     }
/// }
///
/// let observer = Arc::new(CountingObserver::default());
/// let mut services = ServiceCollection::new();
/// services.add_transient::<Clock>().unwrap();
/// services.add_observer(observer.clone());
///
/// let provider = services.build();
/// provider.get_instance::<Clock>().unwrap();
/// provider.get_instance::<Clock>().unwrap();
///
/// assert_eq!(observer.compiled.load(Ordering::SeqCst), 1);
/// assert_eq!(observer.resolved.load(Ordering::SeqCst), 2);
/// ```
pub trait DiObserver: Send + Sync {
    /// Called once per root key after its factory has been compiled.
    fn compiled(&self, key: &Key, factory: &CompiledFactory, elapsed: Duration);

    /// Called after a service was produced by its compiled factory.
    ///
    /// `elapsed` covers cache lookup, any first-time compilation, and the
    /// factory invocation.
    fn resolved(&self, key: &Key, elapsed: Duration);

    /// Called when planning or compiling a root key failed.
    fn compile_failed(&self, key: &Key, error: &DiError) {
        let _ = (key, error);
    }
}

/// Container for registered observers.
#[derive(Default, Clone)]
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

    /// Returns true if any observers are registered.
    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn compiled(&self, key: &Key, factory: &CompiledFactory, elapsed: Duration) {
        for observer in &self.observers {
            observer.compiled(key, factory, elapsed);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, key: &Key, elapsed: Duration) {
        for observer in &self.observers {
            observer.resolved(key, elapsed);
        }
    }

    #[inline]
    pub(crate) fn compile_failed(&self, key: &Key, error: &DiError) {
        for observer in &self.observers {
            observer.compile_failed(key, error);
        }
    }
}

/// Built-in observer that forwards events to `tracing`.
///
/// Events are emitted at `debug` level (`warn` for failures) with the
/// observer's prefix as a field, so they land wherever the application's
/// subscriber sends them.
///
/// # Examples
///
/// ```
/// use ferrous_factory::{LoggingObserver, ServiceCollection};
/// use std::sync::Arc;
///
/// let mut services = ServiceCollection::new();
/// services.add_observer(Arc::new(LoggingObserver::with_prefix("app")));
/// let provider = services.build();
/// ```
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    /// Creates a new logging observer with default prefix.
    pub fn new() -> Self {
        Self {
            prefix: "ferrous-factory".to_string(),
        }
    }

    /// Creates a new logging observer with a custom prefix.
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
    fn compiled(&self, key: &Key, factory: &CompiledFactory, elapsed: Duration) {
        tracing::debug!(
            prefix = %self.prefix,
            service = %key,
            slots = factory.slot_count(),
            nodes = factory.node_count(),
            ?elapsed,
            "factory compiled"
        );
    }

    fn resolved(&self, key: &Key, elapsed: Duration) {
        tracing::debug!(prefix = %self.prefix, service = %key, ?elapsed, "service resolved");
    }

    fn compile_failed(&self, key: &Key, error: &DiError) {
        tracing::warn!(prefix = %self.prefix, service = %key, %error, "factory compilation failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::key_of_type;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl DiObserver for Recorder {
        fn compiled(&self, key: &Key, _: &CompiledFactory, _: Duration) {
            self.events.lock().unwrap().push(format!("compiled {}", key));
        }

        fn resolved(&self, key: &Key, _: Duration) {
            self.events.lock().unwrap().push(format!("resolved {}", key));
        }
    }

    #[test]
    fn test_fan_out_and_default_hook() {
        let recorder = Arc::new(Recorder::default());
        let mut observers = Observers::new();
        assert!(!observers.has_observers());

        observers.add(recorder.clone());
        observers.add(recorder.clone());
        assert!(observers.has_observers());

        let key = key_of_type::<u8>();
        observers.resolved(&key, Duration::from_micros(3));
        observers.compile_failed(&key, &DiError::NotFound("u8"));

        assert_eq!(*recorder.events.lock().unwrap(), vec!["resolved u8", "resolved u8"]);
    }
}
