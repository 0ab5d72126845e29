//! # Synced Todo Core
//!
//! Core traits and types for a reducer-driven store whose state mirrors a
//! remote realtime key-value database.
//!
//! ## Core Concepts
//!
//! - **State**: Domain state held by the store
//! - **Action**: Closed set of inputs the reducer understands
//! - **Reducer**: Pure function `(State, Action, Environment) → State`
//! - **Environment**: Injected dependencies via traits
//! - **Remote store**: The narrow key-value CRUD boundary to the hosted database
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell
//! - Unidirectional Data Flow
//! - Remote write confirmed before local dispatch
//! - Dependency Injection via Environment
//!
//! ## Example
//!
//! ```ignore
//! use synced_todo_core::reducer::Reducer;
//!
//! impl Reducer for TodoReducer {
//!     type State = TodoState;
//!     type Action = TodoAction;
//!     type Environment = TodoEnvironment;
//!
//!     fn reduce(&self, state: &TodoState, action: &TodoAction, _env: &TodoEnvironment) -> TodoState {
//!         reduce(state, action)
//!     }
//! }
//! ```

/// Remote key-value store boundary (collections of JSON entries)
pub mod remote;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → State`
///
/// They contain all state transition logic and are deterministic and testable.
/// I/O happens before an action is dispatched, never inside a reducer.
pub mod reducer {
    /// The Reducer trait - core abstraction for state transitions
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Compute the state that follows `action`
        ///
        /// Implementations must not have side effects and must leave `state`
        /// untouched; the runtime swaps in the returned value.
        fn reduce(
            &self,
            state: &Self::State,
            action: &Self::Action,
            env: &Self::Environment,
        ) -> Self::State;
    }
}

/// Environment module - Dependency injection traits
///
/// External dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// Key generation is time-ordered, so tests inject a fixed clock to
    /// get reproducible keys.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock used in production
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
