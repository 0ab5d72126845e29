//! Errors returned by the domain operations.

use std::time::Duration;
use synced_todo_core::remote::RemoteStoreError;
use synced_todo_runtime::StoreError;
use thiserror::Error;

/// Why a todo operation did not complete.
///
/// Whenever one of these is returned, nothing was dispatched for that
/// operation and local state is unchanged.
#[derive(Error, Debug)]
pub enum TodoError {
    /// The text of a new or edited todo was empty.
    #[error("Todo text must not be empty")]
    EmptyText,

    /// The remote store produced an empty key.
    #[error("Remote store returned an empty key for collection {collection:?}")]
    EmptyKey {
        /// Collection the key was requested for
        collection: String,
    },

    /// The remote store rejected or failed the request.
    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteStoreError),

    /// The operation (retries included) exceeded its time budget.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Operation name (`add`, `update`, `delete`, `hydrate`)
        operation: &'static str,
        /// Configured bound
        after: Duration,
    },

    /// The remote write succeeded but the store refused the action.
    #[error("Dispatch failed: {0}")]
    Dispatch(#[from] StoreError),
}

impl TodoError {
    /// Whether the caller may reasonably try the same operation again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Remote(error) => error.is_transient(),
            Self::Timeout { .. } => true,
            Self::EmptyText | Self::EmptyKey { .. } | Self::Dispatch(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(TodoError::Remote(RemoteStoreError::Timeout).is_retryable());
        assert!(!TodoError::Remote(RemoteStoreError::PermissionDenied("no".into())).is_retryable());
        assert!(!TodoError::EmptyText.is_retryable());
        assert!(
            TodoError::Timeout {
                operation: "add",
                after: Duration::from_secs(1)
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_messages() {
        let err = TodoError::Timeout {
            operation: "delete",
            after: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "delete timed out after 250ms");
        assert_eq!(
            TodoError::Dispatch(StoreError::ShutdownInProgress).to_string(),
            format!("Dispatch failed: {}", StoreError::ShutdownInProgress)
        );
    }
}
