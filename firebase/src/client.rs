//! Realtime Database REST client implementing [`RemoteStore`].

use crate::config::FirebaseConfig;
use crate::push_id::PushIdGenerator;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use synced_todo_core::environment::{Clock, SystemClock};
use synced_todo_core::remote::{
    RemoteFuture, RemoteStore, RemoteStoreError, Snapshot, validate_key,
};

/// Realtime Database store speaking the REST protocol.
///
/// Every entry lives at `{database_url}/{collection}/{key}.json`. Keys are
/// minted locally by a [`PushIdGenerator`], exactly as the client SDKs do.
#[derive(Debug)]
pub struct FirebaseStore {
    client: Client,
    config: FirebaseConfig,
    keys: PushIdGenerator,
}

impl FirebaseStore {
    /// Create a store using the system clock for key generation.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: FirebaseConfig) -> Result<Self, RemoteStoreError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a store with an injected clock for key generation.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::Transport`] if the HTTP client cannot be built.
    pub fn with_clock(config: FirebaseConfig, clock: Arc<dyn Clock>) -> Result<Self, RemoteStoreError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RemoteStoreError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            config,
            keys: PushIdGenerator::new(clock),
        })
    }

    /// Configuration this store was built with.
    #[must_use]
    pub const fn config(&self) -> &FirebaseConfig {
        &self.config
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{collection}.json", self.config.database_url)
    }

    fn entry_url(&self, collection: &str, key: &str) -> String {
        format!("{}/{collection}/{key}.json", self.config.database_url)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.config.auth_token {
            Some(token) => builder.query(&[("auth", token)]),
            None => builder,
        }
    }

    #[tracing::instrument(skip(self, value))]
    async fn put(&self, collection: String, key: String, value: Value) -> Result<(), RemoteStoreError> {
        validate_key(&collection)?;
        validate_key(&key)?;

        let response = self
            .request(Method::PUT, self.entry_url(&collection, &key))
            .json(&value)
            .send()
            .await
            .map_err(map_transport_error)?;
        check_status(response).await?;

        tracing::debug!("Entry written");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, collection: String, key: String) -> Result<(), RemoteStoreError> {
        validate_key(&collection)?;
        validate_key(&key)?;

        let response = self
            .request(Method::DELETE, self.entry_url(&collection, &key))
            .send()
            .await
            .map_err(map_transport_error)?;
        check_status(response).await?;

        tracing::debug!("Entry removed");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get_all(&self, collection: String) -> Result<Option<Snapshot>, RemoteStoreError> {
        validate_key(&collection)?;

        let response = self
            .request(Method::GET, self.collection_url(&collection))
            .send()
            .await
            .map_err(map_transport_error)?;
        let body: Value = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RemoteStoreError::Timeout
                } else {
                    RemoteStoreError::Decode(e.to_string())
                }
            })?;

        let snapshot = decode_snapshot(body)?;
        tracing::debug!(
            entries = snapshot.as_ref().map_or(0, Snapshot::len),
            "Collection fetched"
        );
        Ok(snapshot)
    }
}

impl RemoteStore for FirebaseStore {
    fn generate_key(&self, collection: &str) -> Result<String, RemoteStoreError> {
        validate_key(collection)?;
        Ok(self.keys.next_id())
    }

    fn write(&self, collection: String, key: String, value: Value) -> RemoteFuture<'_, ()> {
        Box::pin(self.put(collection, key, value))
    }

    fn remove(&self, collection: String, key: String) -> RemoteFuture<'_, ()> {
        Box::pin(self.delete(collection, key))
    }

    fn fetch_all_once(&self, collection: String) -> RemoteFuture<'_, Option<Snapshot>> {
        Box::pin(self.get_all(collection))
    }
}

fn map_transport_error(error: reqwest::Error) -> RemoteStoreError {
    if error.is_timeout() {
        RemoteStoreError::Timeout
    } else {
        RemoteStoreError::Transport(error.to_string())
    }
}

/// Map non-success statuses onto [`RemoteStoreError`].
async fn check_status(response: Response) -> Result<Response, RemoteStoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body);
    tracing::warn!(status = status.as_u16(), %message, "Database rejected request");

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(RemoteStoreError::PermissionDenied(message))
        },
        status => Err(RemoteStoreError::Http {
            status: status.as_u16(),
            message,
        }),
    }
}

/// The database reports errors as `{"error": "..."}`; fall back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// `null` and `{}` both mean the collection does not exist.
fn decode_snapshot(body: Value) -> Result<Option<Snapshot>, RemoteStoreError> {
    match body {
        Value::Null => Ok(None),
        Value::Object(map) if map.is_empty() => Ok(None),
        Value::Object(map) => Ok(Some(map.into_iter().collect())),
        other => Err(RemoteStoreError::Decode(format!(
            "expected an object keyed by entry id, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use synced_todo_testing::test_clock;

    fn store(config: FirebaseConfig) -> FirebaseStore {
        FirebaseStore::with_clock(config, Arc::new(test_clock())).unwrap()
    }

    #[test]
    fn test_urls() {
        let store = store(FirebaseConfig::new("https://demo.firebaseio.com/"));
        assert_eq!(
            store.collection_url("todos"),
            "https://demo.firebaseio.com/todos.json"
        );
        assert_eq!(
            store.entry_url("todos", "k1"),
            "https://demo.firebaseio.com/todos/k1.json"
        );
    }

    #[test]
    fn test_generate_key_validates_collection() {
        let store = store(FirebaseConfig::new("https://demo.firebaseio.com"));
        assert_eq!(store.generate_key("todos").unwrap().len(), 20);
        assert!(store.generate_key("to/dos").is_err());
    }

    #[test]
    fn test_decode_snapshot() {
        assert_eq!(decode_snapshot(Value::Null).unwrap(), None);
        assert_eq!(decode_snapshot(json!({})).unwrap(), None);

        let snapshot = decode_snapshot(json!({"b": 2, "a": 1})).unwrap().unwrap();
        assert_eq!(snapshot.keys().collect::<Vec<_>>(), vec!["a", "b"]);

        assert!(matches!(
            decode_snapshot(json!([1, 2])),
            Err(RemoteStoreError::Decode(_))
        ));
    }

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(r#"{"error": "Permission denied"}"#), "Permission denied");
        assert_eq!(error_message("  gateway down \n"), "gateway down");
    }
}
