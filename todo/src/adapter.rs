//! Typed view of the remote store.
//!
//! Entries are stored at `<collection>/<key>` as `{"todo": {"id", "text"}}`.
//! Older entries written as `{"todo": "<text>"}` are still read. In both
//! cases the item id is the entry key.

use crate::types::TodoItem;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use synced_todo_core::remote::{RemoteStore, RemoteStoreError};

#[derive(Serialize, Deserialize)]
struct Entry {
    todo: Body,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum Body {
    Item {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        text: String,
    },
    Legacy(String),
}

/// Encode `item` as a remote entry.
///
/// # Errors
///
/// Returns [`RemoteStoreError::Decode`] if the entry cannot be serialized.
/// Writing `null` would delete the remote entry, so there is no fallback value.
pub fn encode(item: &TodoItem) -> Result<Value, RemoteStoreError> {
    let entry = Entry {
        todo: Body::Item {
            id: Some(item.id.clone()),
            text: item.text.clone(),
        },
    };
    serde_json::to_value(entry).map_err(|e| RemoteStoreError::Decode(e.to_string()))
}

/// Decode the entry stored under `key`, if it has a recognizable shape.
#[must_use]
pub fn decode(key: &str, value: Value) -> Option<TodoItem> {
    let Entry { todo } = serde_json::from_value(value).ok()?;
    let text = match todo {
        Body::Item { text, .. } | Body::Legacy(text) => text,
    };
    Some(TodoItem::new(key, text))
}

/// Fresh key for a new item in `collection`.
///
/// # Errors
///
/// Returns [`RemoteStoreError::InvalidKey`] if `collection` is not addressable.
pub fn generate_key(store: &dyn RemoteStore, collection: &str) -> Result<String, RemoteStoreError> {
    store.generate_key(collection)
}

/// Write `item` at `collection/key`.
///
/// # Errors
///
/// Propagates the encoding or remote store failure.
pub async fn write(
    store: &dyn RemoteStore,
    collection: &str,
    key: &str,
    item: &TodoItem,
) -> Result<(), RemoteStoreError> {
    let value = encode(item)?;
    store.write(collection.to_string(), key.to_string(), value).await
}

/// Delete the entry at `collection/key`.
///
/// # Errors
///
/// Propagates the remote store's failure.
pub async fn remove(store: &dyn RemoteStore, collection: &str, key: &str) -> Result<(), RemoteStoreError> {
    store.remove(collection.to_string(), key.to_string()).await
}

/// Read every item of `collection` once, ordered by key.
///
/// Returns `None` when the collection does not exist. Entries that are not
/// todos are skipped with a warning.
///
/// # Errors
///
/// Propagates the remote store's failure.
pub async fn fetch_all_once(
    store: &dyn RemoteStore,
    collection: &str,
) -> Result<Option<BTreeMap<String, TodoItem>>, RemoteStoreError> {
    let Some(snapshot) = store.fetch_all_once(collection.to_string()).await? else {
        return Ok(None);
    };

    let items = snapshot
        .into_iter()
        .filter_map(|(key, value)| match decode(&key, value) {
            Some(item) => Some((key, item)),
            None => {
                tracing::warn!(collection, key = %key, "Skipping malformed todo entry");
                None
            },
        })
        .collect();

    Ok(Some(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use synced_todo_testing::InMemoryRemoteStore;

    #[test]
    fn test_encode_shape() {
        assert_eq!(
            encode(&TodoItem::new("k1", "buy milk")).unwrap(),
            json!({"todo": {"id": "k1", "text": "buy milk"}})
        );
    }

    #[tokio::test]
    async fn test_write_stores_an_object() {
        let store = InMemoryRemoteStore::new();
        let item = TodoItem::new("k1", "quote \" and \u{1F95B}");

        write(&store, "todos", "k1", &item).await.unwrap();

        let stored = store.get("todos", "k1").unwrap();
        assert!(stored.is_object());
        assert_eq!(decode("k1", stored), Some(item));
    }

    #[test]
    fn test_decode_current_and_legacy() {
        assert_eq!(
            decode("k1", json!({"todo": {"id": "k1", "text": "a"}})),
            Some(TodoItem::new("k1", "a"))
        );
        assert_eq!(
            decode("k2", json!({"todo": "b"})),
            Some(TodoItem::new("k2", "b"))
        );
    }

    #[test]
    fn test_decode_uses_entry_key_as_id() {
        assert_eq!(
            decode("real", json!({"todo": {"id": "stale", "text": "a"}})),
            Some(TodoItem::new("real", "a"))
        );
        assert_eq!(
            decode("k3", json!({"todo": {"text": "no id"}})),
            Some(TodoItem::new("k3", "no id"))
        );
    }

    #[test]
    fn test_decode_rejects_other_shapes() {
        assert_eq!(decode("k", json!(42)), None);
        assert_eq!(decode("k", json!({"todo": 7})), None);
        assert_eq!(decode("k", json!({"item": "x"})), None);
    }

    #[tokio::test]
    async fn test_write_then_fetch_round_trip() {
        let store = InMemoryRemoteStore::new();
        let key = generate_key(&store, "todos").unwrap();

        write(&store, "todos", &key, &TodoItem::new(key.clone(), "buy milk"))
            .await
            .unwrap();

        let items = fetch_all_once(&store, "todos").await.unwrap().unwrap();
        assert_eq!(items.get(&key).map(|t| t.text.as_str()), Some("buy milk"));
    }

    #[tokio::test]
    async fn test_fetch_skips_malformed_entries() {
        let store = InMemoryRemoteStore::new()
            .with_entry("todos", "a", json!({"todo": "fine"}))
            .with_entry("todos", "b", json!("garbage"));

        let items = fetch_all_once(&store, "todos").await.unwrap().unwrap();
        assert_eq!(items.len(), 1);
        assert!(items.contains_key("a"));
    }

    #[tokio::test]
    async fn test_fetch_absent_collection() {
        let store = InMemoryRemoteStore::new();
        assert_eq!(fetch_all_once(&store, "todos").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = InMemoryRemoteStore::new().with_entry("todos", "a", json!({"todo": "x"}));
        remove(&store, "todos", "a").await.unwrap();
        assert_eq!(store.len("todos"), 0);
    }
}
