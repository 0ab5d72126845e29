//! Injected dependencies for the todo store.

use crate::config::TodoConfig;
use std::sync::Arc;
use synced_todo_core::remote::RemoteStore;

/// Environment dependencies for the todo store
///
/// Cloning is cheap: the remote store is shared.
#[derive(Clone)]
pub struct TodoEnvironment {
    /// Remote key-value store the list is synchronized with
    pub remote: Arc<dyn RemoteStore>,
    /// Collection name, timeout and retry settings
    pub config: TodoConfig,
}

impl TodoEnvironment {
    /// Creates a new `TodoEnvironment`
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteStore>, config: TodoConfig) -> Self {
        Self { remote, config }
    }

    /// Collection the items live in
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.config.collection
    }
}

impl std::fmt::Debug for TodoEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoEnvironment")
            .field("remote", &"<dyn RemoteStore>")
            .field("config", &self.config)
            .finish()
    }
}
