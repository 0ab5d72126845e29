//! # Synced Todo Testing
//!
//! Testing utilities for the synced todo store.
//!
//! This crate provides:
//! - Deterministic clocks for time-ordered key generation
//! - [`InMemoryRemoteStore`]: a remote store with failure injection and call counters
//! - [`RecordingDispatcher`]: captures dispatched actions without a running store
//! - [`ReducerTest`]: Given-When-Then harness for reducers
//!
//! ## Example
//!
//! ```ignore
//! use synced_todo_testing::{InMemoryRemoteStore, RecordingDispatcher};
//!
//! #[tokio::test]
//! async fn add_dispatches_after_write() {
//!     let remote = InMemoryRemoteStore::new();
//!     let env = TodoEnvironment::new(Arc::new(remote.clone()), TodoConfig::default());
//!     let dispatcher = RecordingDispatcher::new();
//!
//!     add_todo(&env, "buy milk", &dispatcher).await.unwrap();
//!
//!     assert_eq!(remote.write_count(), 1);
//!     assert_eq!(dispatcher.len(), 1);
//! }
//! ```

use chrono::{DateTime, Utc};
use synced_todo_core::environment::Clock;

mod dispatch_mocks;
mod remote_mocks;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::Mutex;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use synced_todo_testing::mocks::FixedClock;
    /// use synced_todo_core::environment::Clock;
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

    /// Clock that replays a scripted sequence of instants.
    ///
    /// Each call to `now()` returns the next instant; the last one repeats
    /// once the script is exhausted. Useful for exercising clock skew.
    #[derive(Debug)]
    pub struct ScriptedClock {
        times: Mutex<Vec<DateTime<Utc>>>,
        last: DateTime<Utc>,
    }

    impl ScriptedClock {
        /// Create a clock that returns `times` in order.
        ///
        /// An empty script behaves like [`test_clock`].
        #[must_use]
        pub fn new(times: Vec<DateTime<Utc>>) -> Self {
            let last = times.last().copied().unwrap_or_else(|| test_clock().now());
            let mut reversed = times;
            reversed.reverse();
            Self {
                times: Mutex::new(reversed),
                last,
            }
        }
    }

    impl Clock for ScriptedClock {
        fn now(&self) -> DateTime<Utc> {
            self.times
                .lock()
                .ok()
                .and_then(|mut times| times.pop())
                .unwrap_or(self.last)
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
}

// Re-export commonly used items
pub use dispatch_mocks::RecordingDispatcher;
pub use mocks::{FixedClock, ScriptedClock, test_clock};
pub use reducer_test::ReducerTest;
pub use remote_mocks::InMemoryRemoteStore;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn test_scripted_clock_replays_then_repeats_last() {
        let start = test_clock().now();
        let later = start + Duration::milliseconds(5);
        let clock = ScriptedClock::new(vec![later, start]);

        assert_eq!(clock.now(), later);
        assert_eq!(clock.now(), start);
        assert_eq!(clock.now(), start);
    }
}
