//! # Reactive Atoms Testing
//!
//! Testing utilities and helpers for the Reactive Atoms architecture.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - A Given-When-Then builder for reducers ([`ReducerTest`])
//! - Assertion helpers for effects
//! - Tracing setup for tests
//!
//! ## Example
//!
//! ```ignore
//! use reactive_atoms_testing::mocks::{MemoryStorage, SequentialIds};
//! use std::sync::Arc;
//!
//! #[tokio::test]
//! async fn test_add_persists() {
//!     let storage = Arc::new(MemoryStorage::new());
//!     let app = TodoApp::open(TodoConfig::default(), storage.clone(), Arc::new(SequentialIds::new())).await;
//!
//!     app.add("Buy milk").await;
//!
//!     assert_eq!(storage.writes(), 1);
//! }
//! ```

use chrono::{DateTime, Utc};
use reactive_atoms_core::environment::{Clock, IdGenerator, Storage, StorageError};


pub use reducer_test::{ReducerTest, assertions, run_effects};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, IdGenerator, Storage, StorageError, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use reactive_atoms_testing::mocks::FixedClock;
    /// use reactive_atoms_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Predictable ids: `todo-1`, `todo-2`, ...
    #[derive(Debug)]
    pub struct SequentialIds {
        prefix: String,
        next: AtomicU64,
    }

    impl SequentialIds {
        /// Ids prefixed with `todo`
        #[must_use]
        pub fn new() -> Self {
            Self::with_prefix("todo")
        }

        /// Ids prefixed with `prefix`
        #[must_use]
        pub fn with_prefix(prefix: impl Into<String>) -> Self {
            Self {
                prefix: prefix.into(),
                next: AtomicU64::new(1),
            }
        }
    }

    impl Default for SequentialIds {
        fn default() -> Self {
            Self::new()
        }
    }

    impl IdGenerator for SequentialIds {
        fn next_id(&self) -> String {
            let n = self.next.fetch_add(1, Ordering::Relaxed);
            format!("{}-{n}", self.prefix)
        }
    }

    /// In-memory key-value storage with fault injection
    ///
    /// Counts every write attempt, so tests can assert that an operation did
    /// (or did not) persist.
    #[derive(Debug, Default)]
    pub struct MemoryStorage {
        entries: Mutex<HashMap<String, String>>,
        writes: AtomicUsize,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
        quota: Option<usize>,
    }

    impl MemoryStorage {
        /// Empty storage accepting every read and write
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populate `key` with a raw value
        #[must_use]
        pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
            self.entries
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .insert(key.into(), value.into());
            self
        }

        /// Reject values longer than `limit` bytes
        #[must_use]
        pub const fn with_quota(mut self, limit: usize) -> Self {
            self.quota = Some(limit);
            self
        }

        /// Make every following read fail (or succeed again)
        pub fn fail_reads(&self, fail: bool) {
            self.fail_reads.store(fail, Ordering::SeqCst);
        }

        /// Make every following write fail (or succeed again)
        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        /// Number of write attempts so far, failed ones included
        #[must_use]
        pub fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        /// Raw value stored under `key`
        #[must_use]
        pub fn entry(&self, key: &str) -> Option<String> {
            self.entries
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .get(key)
                .cloned()
        }
    }

    impl Storage for MemoryStorage {
        fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("reads disabled".to_string()));
            }
            Ok(self.entry(key))
        }

        fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.writes.fetch_add(1, Ordering::SeqCst);

            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("writes disabled".to_string()));
            }
            if let Some(limit) = self.quota.filter(|&limit| value.len() > limit) {
                return Err(StorageError::QuotaExceeded {
                    needed: value.len(),
                    limit,
                });
            }

            self.entries
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }
}

/// Install a `tracing` subscriber for tests
///
/// Honors `RUST_LOG` and defaults to `warn`. Safe to call from every test;
/// only the first call installs anything.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{FixedClock, MemoryStorage, SequentialIds, test_clock};
