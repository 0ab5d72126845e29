//! Firebase Realtime Database backend for the synced todo store.
//!
//! Implements [`RemoteStore`](synced_todo_core::remote::RemoteStore) over the
//! database's REST API using `reqwest`.
//!
//! # Example
//!
//! ```rust,no_run
//! use synced_todo_firebase::{FirebaseConfig, FirebaseStore};
//! use synced_todo_core::remote::RemoteStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FirebaseConfig::from_env()?;
//! let store = FirebaseStore::new(config)?;
//!
//! let key = store.generate_key("todos")?;
//! store
//!     .write("todos".into(), key, serde_json::json!({"todo": {"text": "buy milk"}}))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod push_id;

pub use client::FirebaseStore;
pub use config::{ConfigError, FirebaseConfig};
pub use push_id::PushIdGenerator;
