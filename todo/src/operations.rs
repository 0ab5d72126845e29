//! Domain operations: remote write first, local dispatch second.
//!
//! Each operation talks to the remote store through [`crate::adapter`] and
//! only dispatches once the store has confirmed the change. On any failure
//! nothing is dispatched and the error is returned to the caller.
//!
//! Remote calls are retried for transient failures according to
//! [`TodoConfig::retry_policy`](crate::config::TodoConfig::retry_policy);
//! the whole operation, retries included, is bounded by
//! [`TodoConfig::operation_timeout`](crate::config::TodoConfig::operation_timeout).

use crate::adapter;
use crate::environment::TodoEnvironment;
use crate::error::TodoError;
use crate::types::{TodoAction, TodoItem};
use std::future::Future;
use std::time::Instant;
use synced_todo_core::remote::RemoteStoreError;
use synced_todo_runtime::Dispatch;
use synced_todo_runtime::metrics::{OperationMetrics, Outcome};
use synced_todo_runtime::retry::retry_with_predicate;

/// Create a new todo with `text`.
///
/// Generates a key, writes `{id, text}` remotely, then dispatches
/// [`TodoAction::AddTodo`]. Returns the stored item.
///
/// # Errors
///
/// - [`TodoError::EmptyText`] / [`TodoError::EmptyKey`]: nothing was written
/// - [`TodoError::Remote`] / [`TodoError::Timeout`]: the write failed
/// - [`TodoError::Dispatch`]: written remotely, but the store refused the action
#[tracing::instrument(skip(env, dispatch), fields(collection = %env.collection()))]
pub async fn add_todo<D>(env: &TodoEnvironment, text: &str, dispatch: &D) -> Result<TodoItem, TodoError>
where
    D: Dispatch<TodoAction> + ?Sized,
{
    measured("add", async {
        // The key is drawn before the text check, so rejected input still
        // consumes one. Push-ids tolerate gaps.
        let id = adapter::generate_key(env.remote.as_ref(), env.collection())?;
        if text.is_empty() {
            return Err(TodoError::EmptyText);
        }
        if id.is_empty() {
            return Err(TodoError::EmptyKey {
                collection: env.collection().to_string(),
            });
        }

        let item = TodoItem::new(id, text);
        remote_call(env, "add", || {
            adapter::write(env.remote.as_ref(), env.collection(), &item.id, &item)
        })
        .await?;
        tracing::debug!(id = %item.id, "Todo written to remote store");

        dispatch.dispatch(TodoAction::add(item.id.clone(), item.text.clone())).await?;
        Ok(item)
    })
    .await
}

/// Replace the text of the todo `id` with `new_text`.
///
/// Overwrites the remote entry, then dispatches [`TodoAction::UpdateTodo`].
///
/// # Errors
///
/// - [`TodoError::EmptyText`]: nothing was written
/// - [`TodoError::Remote`]: `id` is not a valid key, or the write failed
/// - [`TodoError::Timeout`], [`TodoError::Dispatch`]: as for [`add_todo`]
#[tracing::instrument(skip(env, dispatch), fields(collection = %env.collection()))]
pub async fn update_todo<D>(
    env: &TodoEnvironment,
    id: &str,
    new_text: &str,
    dispatch: &D,
) -> Result<TodoItem, TodoError>
where
    D: Dispatch<TodoAction> + ?Sized,
{
    measured("update", async {
        if new_text.is_empty() {
            return Err(TodoError::EmptyText);
        }

        let item = TodoItem::new(id, new_text);
        remote_call(env, "update", || {
            adapter::write(env.remote.as_ref(), env.collection(), &item.id, &item)
        })
        .await?;
        tracing::debug!("Todo updated in remote store");

        dispatch.dispatch(TodoAction::update(item.id.clone(), item.text.clone())).await?;
        Ok(item)
    })
    .await
}

/// Delete the todo `id`.
///
/// Removes the remote entry, then dispatches [`TodoAction::DeleteTodo`].
///
/// # Errors
///
/// - [`TodoError::Remote`]: `id` is not a valid key, or the removal failed
/// - [`TodoError::Timeout`], [`TodoError::Dispatch`]: as for [`add_todo`]
#[tracing::instrument(skip(env, dispatch), fields(collection = %env.collection()))]
pub async fn delete_todo<D>(env: &TodoEnvironment, id: &str, dispatch: &D) -> Result<(), TodoError>
where
    D: Dispatch<TodoAction> + ?Sized,
{
    measured("delete", async {
        remote_call(env, "delete", || {
            adapter::remove(env.remote.as_ref(), env.collection(), id)
        })
        .await?;
        tracing::debug!("Todo removed from remote store");

        dispatch.dispatch(TodoAction::delete(id)).await?;
        Ok(())
    })
    .await
}

/// Read the collection once and dispatch one [`TodoAction::AddTodo`] per item.
///
/// Items are dispatched in key order. An absent collection yields no items.
///
/// # Errors
///
/// - [`TodoError::Remote`] / [`TodoError::Timeout`]: the read failed; nothing was dispatched
/// - [`TodoError::Dispatch`]: the store refused an action part way through
#[tracing::instrument(skip(env, dispatch), fields(collection = %env.collection()))]
pub async fn hydrate<D>(env: &TodoEnvironment, dispatch: &D) -> Result<Vec<TodoItem>, TodoError>
where
    D: Dispatch<TodoAction> + ?Sized,
{
    measured("hydrate", async {
        let fetched = remote_call(env, "hydrate", || {
            adapter::fetch_all_once(env.remote.as_ref(), env.collection())
        })
        .await?
        .unwrap_or_default();

        let mut items = Vec::with_capacity(fetched.len());
        for item in fetched.into_values() {
            dispatch.dispatch(TodoAction::add(item.id.clone(), item.text.clone())).await?;
            items.push(item);
        }

        tracing::debug!(count = items.len(), "Hydrated todos from remote store");
        Ok(items)
    })
    .await
}

/// Run one remote call under the configured retry policy and time bound.
async fn remote_call<T, F, Fut>(env: &TodoEnvironment, operation: &'static str, call: F) -> Result<T, TodoError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RemoteStoreError>>,
{
    let after = env.config.operation_timeout;
    let attempts = retry_with_predicate(&env.config.retry_policy, call, RemoteStoreError::is_transient);

    match tokio::time::timeout(after, attempts).await {
        Ok(result) => result.map_err(TodoError::from),
        Err(_elapsed) => {
            tracing::warn!(operation, ?after, "Remote call timed out");
            Err(TodoError::Timeout { operation, after })
        },
    }
}

/// Record duration and outcome of an operation, and log failures.
async fn measured<T, Fut>(operation: &'static str, body: Fut) -> Result<T, TodoError>
where
    Fut: Future<Output = Result<T, TodoError>>,
{
    let start = Instant::now();
    let result = body.await;
    let outcome = match &result {
        Ok(_) => Outcome::Success,
        Err(error) => {
            tracing::warn!(operation, %error, "Todo operation failed");
            Outcome::Failure
        },
    };
    OperationMetrics::record(operation, outcome, start.elapsed());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TodoConfig;
    use std::sync::Arc;
    use std::time::Duration;
    use synced_todo_runtime::retry::RetryPolicy;
    use synced_todo_testing::{InMemoryRemoteStore, RecordingDispatcher};

    fn env_with(remote: &InMemoryRemoteStore, config: TodoConfig) -> TodoEnvironment {
        TodoEnvironment::new(Arc::new(remote.clone()), config)
    }

    fn instant_retries(n: usize) -> RetryPolicy {
        RetryPolicy::builder()
            .max_retries(n)
            .initial_delay(Duration::ZERO)
            .max_delay(Duration::ZERO)
            .build()
    }

    #[tokio::test]
    async fn test_add_writes_then_dispatches() {
        let remote = InMemoryRemoteStore::new();
        let env = env_with(&remote, TodoConfig::default());
        let dispatcher = RecordingDispatcher::new();

        let item = add_todo(&env, "buy milk", &dispatcher).await.unwrap();

        assert_eq!(remote.write_count(), 1);
        assert!(remote.get("todos", &item.id).is_some());
        assert_eq!(
            dispatcher.actions(),
            vec![TodoAction::add(item.id.clone(), "buy milk")]
        );
    }

    #[tokio::test]
    async fn test_add_empty_text_touches_nothing() {
        let remote = InMemoryRemoteStore::new();
        let env = env_with(&remote, TodoConfig::default());
        let dispatcher = RecordingDispatcher::new();

        let result = add_todo(&env, "", &dispatcher).await;

        assert!(matches!(result, Err(TodoError::EmptyText)));
        assert_eq!(remote.key_count(), 1);
        assert_eq!(remote.write_count(), 0);
        assert!(dispatcher.is_empty());
    }

    #[tokio::test]
    async fn test_add_empty_key_touches_nothing() {
        let remote = InMemoryRemoteStore::new();
        remote.generate_empty_keys(true);
        let env = env_with(&remote, TodoConfig::default());
        let dispatcher = RecordingDispatcher::new();

        let result = add_todo(&env, "buy milk", &dispatcher).await;

        assert!(matches!(result, Err(TodoError::EmptyKey { .. })));
        assert_eq!(remote.write_count(), 0);
        assert!(dispatcher.is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_does_not_dispatch() {
        let remote = InMemoryRemoteStore::new();
        remote.fail_writes(RemoteStoreError::PermissionDenied("rules".into()));
        let env = env_with(&remote, TodoConfig::default());
        let dispatcher = RecordingDispatcher::new();

        let result = add_todo(&env, "buy milk", &dispatcher).await;

        assert!(matches!(
            result,
            Err(TodoError::Remote(RemoteStoreError::PermissionDenied(_)))
        ));
        assert!(dispatcher.is_empty());
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let remote = InMemoryRemoteStore::new();
        remote.fail_next_writes(2, RemoteStoreError::Unavailable("flaky".into()));
        let env = env_with(
            &remote,
            TodoConfig::default().with_retry_policy(instant_retries(3)),
        );
        let dispatcher = RecordingDispatcher::new();

        add_todo(&env, "buy milk", &dispatcher).await.unwrap();

        assert_eq!(remote.write_count(), 3);
        assert_eq!(dispatcher.len(), 1);
    }

    #[tokio::test]
    async fn test_retries_stop_at_policy_bound() {
        let remote = InMemoryRemoteStore::new();
        remote.fail_writes(RemoteStoreError::Timeout);
        let env = env_with(
            &remote,
            TodoConfig::default().with_retry_policy(instant_retries(2)),
        );
        let dispatcher = RecordingDispatcher::new();

        let result = update_todo(&env, "k1", "x", &dispatcher).await;

        assert!(matches!(result, Err(TodoError::Remote(RemoteStoreError::Timeout))));
        assert_eq!(remote.write_count(), 3);
        assert!(dispatcher.is_empty());
    }

    #[tokio::test]
    async fn test_permission_errors_are_never_retried() {
        let remote = InMemoryRemoteStore::new();
        remote.fail_removes(RemoteStoreError::PermissionDenied("rules".into()));
        let env = env_with(
            &remote,
            TodoConfig::default().with_retry_policy(instant_retries(5)),
        );
        let dispatcher = RecordingDispatcher::new();

        assert!(delete_todo(&env, "k1", &dispatcher).await.is_err());
        assert_eq!(remote.remove_count(), 1);
    }

    #[tokio::test]
    async fn test_update_rejects_empty_text() {
        let remote = InMemoryRemoteStore::new();
        let env = env_with(&remote, TodoConfig::default());
        let dispatcher = RecordingDispatcher::new();

        let result = update_todo(&env, "k1", "", &dispatcher).await;

        assert!(matches!(result, Err(TodoError::EmptyText)));
        assert_eq!(remote.write_count(), 0);
    }

    #[tokio::test]
    async fn test_update_invalid_id_fails_without_dispatch() {
        let remote = InMemoryRemoteStore::new();
        let env = env_with(&remote, TodoConfig::default());
        let dispatcher = RecordingDispatcher::new();

        let result = update_todo(&env, "", "x", &dispatcher).await;

        assert!(matches!(
            result,
            Err(TodoError::Remote(RemoteStoreError::InvalidKey { .. }))
        ));
        assert!(dispatcher.is_empty());
    }

    #[tokio::test]
    async fn test_delete_dispatches_after_remove() {
        let remote = InMemoryRemoteStore::new().with_entry("todos", "k1", serde_json::json!({"todo": "a"}));
        let env = env_with(&remote, TodoConfig::default());
        let dispatcher = RecordingDispatcher::new();

        delete_todo(&env, "k1", &dispatcher).await.unwrap();

        assert_eq!(remote.len("todos"), 0);
        assert_eq!(dispatcher.actions(), vec![TodoAction::delete("k1")]);
    }

    #[tokio::test]
    async fn test_dispatch_failure_is_reported() {
        let remote = InMemoryRemoteStore::new();
        let env = env_with(&remote, TodoConfig::default());
        let dispatcher = RecordingDispatcher::new();
        dispatcher.reject_all();

        let result = add_todo(&env, "buy milk", &dispatcher).await;

        assert!(matches!(result, Err(TodoError::Dispatch(_))));
        assert_eq!(remote.write_count(), 1);
    }

    #[tokio::test]
    async fn test_hydrate_dispatches_in_key_order() {
        let remote = InMemoryRemoteStore::new()
            .with_entry("todos", "k2", serde_json::json!({"todo": {"id": "k2", "text": "b"}}))
            .with_entry("todos", "k1", serde_json::json!({"todo": "a"}));
        let env = env_with(&remote, TodoConfig::default());
        let dispatcher = RecordingDispatcher::new();

        let items = hydrate(&env, &dispatcher).await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(
            dispatcher.actions(),
            vec![TodoAction::add("k1", "a"), TodoAction::add("k2", "b")]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_operation_timeout_bounds_retries() {
        let remote = InMemoryRemoteStore::new();
        remote.fail_writes(RemoteStoreError::Unavailable("down".into()));
        let policy = RetryPolicy::builder()
            .max_retries(100)
            .initial_delay(Duration::from_secs(1))
            .max_delay(Duration::from_secs(1))
            .build();
        let env = env_with(
            &remote,
            TodoConfig::default()
                .with_retry_policy(policy)
                .with_operation_timeout(Duration::from_secs(5)),
        );
        let dispatcher = RecordingDispatcher::new();

        let result = add_todo(&env, "buy milk", &dispatcher).await;

        assert!(matches!(
            result,
            Err(TodoError::Timeout { operation: "add", .. })
        ));
        assert!(dispatcher.is_empty());
    }
}
