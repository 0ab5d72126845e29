//! The todo store handed to presentation code.

use crate::environment::TodoEnvironment;
use crate::error::TodoError;
use crate::operations;
use crate::reducer::TodoReducer;
use crate::types::{TodoAction, TodoItem, TodoState};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use synced_todo_runtime::{Store, StoreConfig, StoreError};
use tokio::sync::broadcast;

/// Runtime store specialised for the todo list.
pub type TodoStore = Store<TodoState, TodoAction, TodoEnvironment, TodoReducer>;

/// Result of [`TodoProvider::activate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// First activation: the collection was read and these items dispatched.
    Hydrated {
        /// Items added to local state, in key order
        items: Vec<TodoItem>,
    },
    /// The provider had already been activated; nothing was fetched.
    AlreadyActive,
}

/// Owns the todo store and its environment.
///
/// Construct with [`TodoProvider::new`], call [`activate`](Self::activate)
/// once to hydrate from the remote store, then read state, subscribe to
/// changes, and run the domain operations through it. Cloning is not
/// offered: share it behind an `Arc`.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use todo::{TodoConfig, TodoEnvironment, TodoProvider};
/// use synced_todo_testing::InMemoryRemoteStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let env = TodoEnvironment::new(Arc::new(InMemoryRemoteStore::new()), TodoConfig::default());
/// let provider = TodoProvider::new(env);
/// provider.activate().await?;
///
/// let item = provider.add_todo("buy milk").await?;
/// assert!(provider.state().await.contains(&item.id));
/// # Ok(())
/// # }
/// ```
pub struct TodoProvider {
    store: TodoStore,
    activated: AtomicBool,
}

impl TodoProvider {
    /// Create a provider with empty state.
    #[must_use]
    pub fn new(env: TodoEnvironment) -> Self {
        Self::with_store_config(env, StoreConfig::default())
    }

    /// Create a provider with custom runtime settings.
    #[must_use]
    pub fn with_store_config(env: TodoEnvironment, config: StoreConfig) -> Self {
        Self {
            store: Store::with_config(TodoState::new(), TodoReducer::new(), env, config),
            activated: AtomicBool::new(false),
        }
    }

    /// The injected environment.
    #[must_use]
    pub fn environment(&self) -> &TodoEnvironment {
        self.store.environment()
    }

    /// Whether [`activate`](Self::activate) has been called.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.activated.load(Ordering::Acquire)
    }

    /// Hydrate local state from the remote collection, once.
    ///
    /// Only the first call performs I/O. The provider counts as activated even
    /// if that read fails, so a failed hydration leaves it usable with empty
    /// state and is not repeated.
    ///
    /// # Errors
    ///
    /// Returns the read or dispatch failure of the first activation.
    pub async fn activate(&self) -> Result<Activation, TodoError> {
        if self.activated.swap(true, Ordering::AcqRel) {
            tracing::debug!("Provider already active, skipping fetch");
            return Ok(Activation::AlreadyActive);
        }

        tracing::info!(collection = self.environment().collection(), "Activating todo provider");
        let items = operations::hydrate(self.environment(), &self.store)
            .await
            .inspect_err(|error| tracing::error!(%error, "Initial fetch failed, starting empty"))?;

        Ok(Activation::Hydrated { items })
    }

    /// Snapshot of the current state.
    pub async fn state(&self) -> TodoState {
        self.store.state(Clone::clone).await
    }

    /// Current items, in display order.
    pub async fn todos(&self) -> Vec<TodoItem> {
        self.store.state(|s| s.items().to_vec()).await
    }

    /// Apply `action` to local state without touching the remote store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`dispose`](Self::dispose).
    pub async fn dispatch(&self, action: TodoAction) -> Result<(), StoreError> {
        self.store.send(action).await
    }

    /// Dispatch an action received as JSON, e.g. `{"type":"add-todo","id":..,"text":..}`.
    ///
    /// Payloads that are not one of the known action kinds (or are malformed)
    /// are logged and ignored. Returns whether an action was dispatched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`dispose`](Self::dispose).
    pub async fn dispatch_json(&self, payload: Value) -> Result<bool, StoreError> {
        let kind = payload
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("<missing>")
            .to_string();

        match serde_json::from_value::<TodoAction>(payload) {
            Ok(action) => {
                self.dispatch(action).await?;
                Ok(true)
            },
            Err(error) if TodoAction::KINDS.contains(&kind.as_str()) => {
                tracing::warn!(%kind, %error, "Ignoring malformed action");
                Ok(false)
            },
            Err(_) => {
                tracing::warn!(%kind, "Ignoring unknown action kind");
                Ok(false)
            },
        }
    }

    /// Create a todo remotely, then locally. See [`operations::add_todo`].
    ///
    /// # Errors
    ///
    /// See [`operations::add_todo`].
    pub async fn add_todo(&self, text: &str) -> Result<TodoItem, TodoError> {
        operations::add_todo(self.environment(), text, &self.store).await
    }

    /// Edit a todo remotely, then locally. See [`operations::update_todo`].
    ///
    /// # Errors
    ///
    /// See [`operations::update_todo`].
    pub async fn update_todo(&self, id: &str, new_text: &str) -> Result<TodoItem, TodoError> {
        operations::update_todo(self.environment(), id, new_text, &self.store).await
    }

    /// Delete a todo remotely, then locally. See [`operations::delete_todo`].
    ///
    /// # Errors
    ///
    /// See [`operations::delete_todo`].
    pub async fn delete_todo(&self, id: &str) -> Result<(), TodoError> {
        operations::delete_todo(self.environment(), id, &self.store).await
    }

    /// Receive every action after it has been applied.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TodoAction> {
        self.store.subscribe_actions()
    }

    /// Stop accepting actions and wait up to `timeout` for in-flight work.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if work is still pending.
    pub async fn dispose(&self, timeout: Duration) -> Result<(), StoreError> {
        tracing::info!(?timeout, "Disposing todo provider");
        self.store.shutdown(timeout).await
    }

    /// [`dispose`](Self::dispose) with the store's configured shutdown timeout.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if work is still pending.
    pub async fn dispose_default(&self) -> Result<(), StoreError> {
        tracing::info!("Disposing todo provider");
        self.store.shutdown_default().await
    }
}

impl std::fmt::Debug for TodoProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoProvider")
            .field("environment", self.environment())
            .field("activated", &self.is_active())
            .finish_non_exhaustive()
    }
}
