//! Todo list kept in sync with a hosted realtime key-value database.
//!
//! Every change is written to the remote store first; only after the store
//! confirms it is an action dispatched to the local reducer. On startup the
//! remote collection is read exactly once to hydrate local state.
//!
//! - [`types`]: items, state, and the closed set of actions
//! - [`reducer`]: the pure state transition
//! - [`adapter`]: typed reads and writes against the remote store
//! - [`operations`]: add / update / delete (and the initial hydration)
//! - [`provider`]: the store handle presentation code holds
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use synced_todo_testing::InMemoryRemoteStore;
//! use todo::{TodoConfig, TodoEnvironment, TodoProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = TodoEnvironment::new(Arc::new(InMemoryRemoteStore::new()), TodoConfig::default());
//! let provider = TodoProvider::new(env);
//! provider.activate().await?;
//!
//! let milk = provider.add_todo("Buy milk").await?;
//! provider.update_todo(&milk.id, "Buy oat milk").await?;
//!
//! for todo in provider.todos().await {
//!     println!("{} {}", todo.id, todo.text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod environment;
pub mod error;
pub mod operations;
pub mod provider;
pub mod reducer;
pub mod types;

// Re-export commonly used types
pub use config::TodoConfig;
pub use environment::TodoEnvironment;
pub use error::TodoError;
pub use operations::{add_todo, delete_todo, update_todo};
pub use provider::{Activation, TodoProvider, TodoStore};
pub use reducer::{TodoReducer, reduce};
pub use types::{TodoAction, TodoItem, TodoState};
