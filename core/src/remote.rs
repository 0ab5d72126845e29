//! Remote store trait and related types.
//!
//! This module defines the narrow boundary to the hosted realtime database: a
//! hierarchical key-value store where every entry lives at
//! `<collection>/<key>` and holds a JSON value.
//!
//! # Design
//!
//! The `RemoteStore` trait exposes exactly four operations:
//!
//! - Generate a fresh key scoped to a collection
//! - Write (upsert) a value at `collection/key`
//! - Remove the value at `collection/key`
//! - Fetch the whole collection exactly once
//!
//! There is deliberately no subscription API: the store is read once at
//! startup and kept in sync by write-then-dispatch afterwards.
//!
//! # Implementations
//!
//! - `FirebaseStore` (in `synced-todo-firebase`): Realtime Database REST API
//! - `InMemoryRemoteStore` (in `synced-todo-testing`): deterministic tests with failure injection

use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Entries of one collection, keyed by entry key.
///
/// A `BTreeMap` keeps time-prefixed keys in creation order.
pub type Snapshot = BTreeMap<String, Value>;

/// Boxed future returned by [`RemoteStore`] operations.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RemoteStoreError>> + Send + 'a>>;

/// Longest key the hosted database accepts, in bytes.
pub const MAX_KEY_BYTES: usize = 768;

/// Errors that can occur during remote store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteStoreError {
    /// The key or collection path is not addressable.
    #[error("Invalid key {key:?}: {reason}")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// Why the key was rejected.
        reason: &'static str,
    },

    /// The database rejected the request (rules or credentials).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The database answered with a non-success status.
    #[error("HTTP error (status {status}): {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// The request never reached the database or the connection dropped.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request did not complete in time.
    #[error("Request timed out")]
    Timeout,

    /// The response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The store is unreachable (e.g. simulated outage in tests).
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),
}

impl RemoteStoreError {
    /// Whether retrying the same request may succeed.
    ///
    /// Connectivity problems, timeouts and server-side (5xx) errors are
    /// transient; permission, addressing and decoding errors are not.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::Unavailable(_) => true,
            Self::Http { status, .. } => *status >= 500,
            Self::InvalidKey { .. } | Self::PermissionDenied(_) | Self::Decode(_) => false,
        }
    }
}

/// Remote store abstraction for the hosted key-value database.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; they are shared as
/// `Arc<dyn RemoteStore>` inside the environment.
///
/// # Dyn Compatibility
///
/// This trait uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn`
/// to enable trait object usage (`Arc<dyn RemoteStore>`).
pub trait RemoteStore: Send + Sync {
    /// Generate a fresh, unique key for a new entry in `collection`.
    ///
    /// Key generation is local (no round trip), mirroring how the hosted
    /// database's client SDK mints push keys.
    ///
    /// # Errors
    ///
    /// - `InvalidKey`: `collection` is not addressable
    fn generate_key(&self, collection: &str) -> Result<String, RemoteStoreError>;

    /// Upsert `value` at `collection/key`.
    ///
    /// # Errors
    ///
    /// - `InvalidKey`: the key or collection is not addressable
    /// - `PermissionDenied`, `Http`, `Transport`, `Timeout`: the write failed
    fn write(&self, collection: String, key: String, value: Value) -> RemoteFuture<'_, ()>;

    /// Delete the entry at `collection/key`.
    ///
    /// Removing a key that does not exist succeeds.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`RemoteStore::write`].
    fn remove(&self, collection: String, key: String) -> RemoteFuture<'_, ()>;

    /// Read the whole collection once.
    ///
    /// Returns `None` when the collection does not exist (or is empty, which the
    /// hosted database does not distinguish).
    ///
    /// # Errors
    ///
    /// - `Decode`: the collection is not a key → value mapping
    /// - `PermissionDenied`, `Http`, `Transport`, `Timeout`: the read failed
    fn fetch_all_once(&self, collection: String) -> RemoteFuture<'_, Option<Snapshot>>;
}

/// Check that `key` can be used as a single path segment.
///
/// # Errors
///
/// Returns [`RemoteStoreError::InvalidKey`] if the key is empty, longer than
/// [`MAX_KEY_BYTES`], or contains `.`, `$`, `#`, `[`, `]`, `/` or an ASCII
/// control character.
pub fn validate_key(key: &str) -> Result<(), RemoteStoreError> {
    let invalid = |reason| {
        Err(RemoteStoreError::InvalidKey {
            key: key.to_string(),
            reason,
        })
    };

    if key.is_empty() {
        return invalid("key is empty");
    }
    if key.len() > MAX_KEY_BYTES {
        return invalid("key is longer than 768 bytes");
    }
    if key
        .chars()
        .any(|c| matches!(c, '.' | '$' | '#' | '[' | ']' | '/') || c.is_ascii_control())
    {
        return invalid("key contains a forbidden character");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_push_style_keys() {
        assert!(validate_key("-NxQ3b2kLmZ9aBcDeFgH").is_ok());
        assert!(validate_key("todos").is_ok());
    }

    #[test]
    fn rejects_unaddressable_keys() {
        for key in ["", "a.b", "a/b", "a$", "#x", "[0]", "tab\there"] {
            assert!(
                matches!(validate_key(key), Err(RemoteStoreError::InvalidKey { .. })),
                "expected {key:?} to be rejected"
            );
        }

        let long = "k".repeat(MAX_KEY_BYTES + 1);
        assert!(validate_key(&long).is_err());
    }

    #[test]
    fn transient_classification() {
        assert!(RemoteStoreError::Timeout.is_transient());
        assert!(RemoteStoreError::Transport("reset".into()).is_transient());
        assert!(
            RemoteStoreError::Http {
                status: 503,
                message: String::new()
            }
            .is_transient()
        );
        assert!(
            !RemoteStoreError::Http {
                status: 400,
                message: String::new()
            }
            .is_transient()
        );
        assert!(!RemoteStoreError::PermissionDenied("rules".into()).is_transient());
        assert!(!RemoteStoreError::Decode("not a map".into()).is_transient());
    }
}
