//! # Synced Todo Runtime
//!
//! Runtime implementation for the reducer-driven store.
//!
//! This crate provides the Store runtime that owns state, serializes reducer
//! execution and notifies subscribers of every applied action.
//!
//! ## Core Components
//!
//! - **Store**: The runtime that owns state, the reducer and the injected environment
//! - **Dispatch**: The object-safe entry point domain operations use to submit actions
//! - **Retry**: Bounded exponential backoff for remote calls
//! - **Metrics**: Prometheus recording for the store and the domain operations
//!
//! ## Example
//!
//! ```ignore
//! use synced_todo_runtime::Store;
//!
//! let store = Store::new(TodoState::default(), TodoReducer::new(), environment);
//!
//! // Send an action
//! store.send(TodoAction::DeleteTodo { id }).await?;
//!
//! // Read state
//! let count = store.state(|s| s.len()).await;
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use synced_todo_core::reducer::Reducer;
use tokio::sync::RwLock;

/// Retry logic with exponential backoff
pub mod retry;

/// Prometheus metrics for observability
pub mod metrics;

/// Error types for the Store runtime
pub mod error {
    use std::time::Duration;
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown gave up waiting for an in-flight reduction
        #[error("Shutdown timed out after {0:?} waiting for in-flight actions")]
        ShutdownTimeout(Duration),
    }
}

pub use error::StoreError;

/// Configuration for Store instances
///
/// # Example
///
/// ```ignore
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(256)
///     .with_shutdown_timeout(Duration::from_secs(5));
///
/// let store = Store::with_config(state, reducer, env, config);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of dispatched actions buffered for slow subscribers
    pub broadcast_capacity: usize,
    /// Timeout used by [`Store::shutdown_default`]
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 64,
            default_shutdown_timeout: Duration::from_secs(5),
        }
    }
}

/// Object-safe dispatch entry point
///
/// Domain operations receive a `&dyn Dispatch<A>` (or any `D: Dispatch<A>`)
/// instead of a concrete store, so tests can record dispatched actions
/// without running a reducer.
pub trait Dispatch<A>: Send + Sync {
    /// Submit `action` to the reducer
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the receiving store was disposed.
    fn dispatch(&self, action: A) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;
}

/// Store module - The runtime for reducers
pub mod store {
    use super::{
        Arc, AtomicBool, Dispatch, Duration, Future, Ordering, Pin, Reducer, RwLock, StoreConfig,
        StoreError,
    };
    use tokio::sync::broadcast;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (state transitions)
    /// 3. Environment (injected dependencies)
    /// 4. Change notification (every reduced action is broadcast)
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        shutdown: Arc<AtomicBool>,
        default_shutdown_timeout: Duration,
        /// Every action that went through the reducer, in reduction order
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Uses [`StoreConfig::default()`].
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                shutdown: Arc::new(AtomicBool::new(false)),
                default_shutdown_timeout: config.default_shutdown_timeout,
                action_broadcast,
            }
        }

        /// The injected environment
        #[must_use]
        pub const fn environment(&self) -> &E {
            &self.environment
        }

        /// Whether [`Store::shutdown`] has been initiated
        #[must_use]
        pub fn is_shutting_down(&self) -> bool {
            self.shutdown.load(Ordering::Acquire)
        }

        /// Initiate graceful shutdown of the store
        ///
        /// Sets the shutdown flag, then waits (up to `timeout`) for the write
        /// lock. Once it is acquired every reduction admitted before the flag
        /// was set has been applied, and any later `send` is rejected.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if an in-flight reduction
        /// still holds the state when `timeout` expires.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            self.shutdown.store(true, Ordering::Release);

            if tokio::time::timeout(timeout, self.state.write()).await.is_ok() {
                tracing::info!("No actions in flight, shutdown successful");
                Ok(())
            } else {
                tracing::error!(?timeout, "Shutdown timeout: a reduction is still running");
                Err(StoreError::ShutdownTimeout(timeout))
            }
        }

        /// Shut down with the configured default timeout
        ///
        /// # Errors
        ///
        /// See [`Store::shutdown`].
        pub async fn shutdown_default(&self) -> Result<(), StoreError> {
            self.shutdown(self.default_shutdown_timeout).await
        }

        /// Send an action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment) and stores the result
        /// 3. Broadcasts the action to subscribers before releasing the lock
        ///
        /// Concurrent `send()` calls serialize at the reducer, and subscribers
        /// observe actions in exactly the order they were applied.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<(), StoreError> {
            if self.is_shutting_down() {
                return Err(Self::reject());
            }

            let mut state = self.state.write().await;

            // Shutdown may have started while this send waited for the lock
            if self.is_shutting_down() {
                return Err(Self::reject());
            }

            metrics::counter!("store_actions_total").increment(1);

            let start = std::time::Instant::now();
            let next = {
                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();
                self.reducer.reduce(&state, &action, &self.environment)
            };
            *state = next;
            metrics::histogram!("store_reducer_duration_seconds")
                .record(start.elapsed().as_secs_f64());

            // No subscribers is fine: nobody is rendering yet
            let _ = self.action_broadcast.send(action);
            drop(state);

            Ok(())
        }

        fn reject() -> StoreError {
            tracing::warn!("Rejected action: store is shutting down");
            metrics::counter!("store_shutdown_rejected_actions_total").increment(1);
            StoreError::ShutdownInProgress
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Subscribe to every action processed by this store
        ///
        /// The receiver sees each action after the reducer applied it, so
        /// reading state on receipt observes the change.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }
    }

    impl<S, A, E, R> Dispatch<A> for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Sync + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        fn dispatch(
            &self,
            action: A,
        ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
            Box::pin(self.send(action))
        }
    }
}

pub use store::Store;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, Default)]
    struct TestState {
        value: i64,
        applied: Vec<TestAction>,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        Add(i64),
        /// Blocks the reducer thread, holding the state lock
        Stall(u64),
    }

    struct TestReducer;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = ();

        fn reduce(&self, state: &TestState, action: &TestAction, _env: &()) -> TestState {
            let mut next = state.clone();
            match action {
                TestAction::Add(n) => next.value += n,
                TestAction::Stall(ms) => std::thread::sleep(Duration::from_millis(*ms)),
            }
            next.applied.push(action.clone());
            next
        }
    }

    type TestStore = Store<TestState, TestAction, (), TestReducer>;

    fn test_store() -> TestStore {
        Store::new(TestState::default(), TestReducer, ())
    }

    #[tokio::test]
    async fn send_applies_reducer() {
        let store = test_store();
        store.send(TestAction::Add(3)).await.unwrap();
        store.send(TestAction::Add(4)).await.unwrap();

        assert_eq!(store.state(|s| s.value).await, 7);
    }

    #[tokio::test]
    async fn subscribers_see_actions_after_reduction() {
        let store = test_store();
        let mut rx = store.subscribe_actions();

        store.send(TestAction::Add(5)).await.unwrap();
        store.send(TestAction::Add(-2)).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), TestAction::Add(5));
        assert_eq!(rx.recv().await.unwrap(), TestAction::Add(-2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn broadcast_order_matches_reduction_order() {
        let store = Arc::new(test_store());
        let mut rx = store.subscribe_actions();

        let sends: Vec<_> = (0..40)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.send(TestAction::Add(i)).await })
            })
            .collect();
        for send in sends {
            send.await.unwrap().unwrap();
        }

        let mut received = Vec::new();
        for _ in 0..40 {
            received.push(rx.recv().await.unwrap());
        }

        assert_eq!(received, store.state(|s| s.applied.clone()).await);
    }

    #[tokio::test]
    async fn shutdown_rejects_new_actions() {
        let store = test_store();
        store.send(TestAction::Add(1)).await.unwrap();

        store.shutdown(Duration::from_secs(1)).await.unwrap();
        assert!(store.is_shutting_down());

        let result = store.send(TestAction::Add(1)).await;
        assert!(matches!(result, Err(StoreError::ShutdownInProgress)));
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_waits_for_in_flight_reduction() {
        let store = Arc::new(test_store());
        let stalled = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.send(TestAction::Stall(150)).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        store.shutdown(Duration::from_secs(2)).await.unwrap();

        assert_eq!(store.state(|s| s.applied.len()).await, 1);
        stalled.await.unwrap().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_times_out_on_stuck_reduction() {
        let store = Arc::new(test_store());
        let stalled = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.send(TestAction::Stall(400)).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let result = store.shutdown(Duration::from_millis(20)).await;
        assert!(matches!(result, Err(StoreError::ShutdownTimeout(_))));

        // The reduction admitted before shutdown still completes
        stalled.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn shutdown_default_uses_configured_timeout() {
        let store = Store::with_config(
            TestState::default(),
            TestReducer,
            (),
            StoreConfig::default().with_shutdown_timeout(Duration::from_millis(50)),
        );

        store.shutdown_default().await.unwrap();
        assert!(matches!(
            store.send(TestAction::Add(1)).await,
            Err(StoreError::ShutdownInProgress)
        ));
    }

    #[tokio::test]
    async fn dispatch_trait_forwards_to_send() {
        let store = test_store();
        let dispatcher: &dyn Dispatch<TestAction> = &store;

        dispatcher.dispatch(TestAction::Add(9)).await.unwrap();
        assert_eq!(store.state(|s| s.value).await, 9);
    }

    #[tokio::test]
    async fn concurrent_sends_serialize_at_reducer() {
        let store = test_store();
        let sends = (0..20).map(|_| store.send(TestAction::Add(1)));

        for result in futures::future::join_all(sends).await {
            result.unwrap();
        }
        assert_eq!(store.state(|s| s.value).await, 20);
    }
}
