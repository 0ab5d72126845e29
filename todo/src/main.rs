//! Command-line client for the synced todo list.
//!
//! Talks to a Firebase Realtime Database when `FIREBASE_DATABASE_URL` is set,
//! otherwise to an in-process store (handy for trying the commands out).
//!
//! ```text
//! todo list
//! todo add "Buy milk"
//! todo update <id> "Buy oat milk"
//! todo delete <id>
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use synced_todo_core::remote::RemoteStore;
use synced_todo_firebase::{FirebaseConfig, FirebaseStore, config::DATABASE_URL_VAR};
use synced_todo_runtime::metrics::MetricsExporter;
use synced_todo_testing::InMemoryRemoteStore;
use todo::{Activation, TodoConfig, TodoEnvironment, TodoProvider};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "todo", version, about = "Todo list synced with a realtime database")]
struct Cli {
    /// Remote collection to use (overrides TODO_COLLECTION)
    #[arg(long)]
    collection: Option<String>,

    /// Print Prometheus metrics after the command
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show all todos
    List,
    /// Add a todo
    Add {
        /// Todo text
        text: String,
    },
    /// Replace the text of a todo
    Update {
        /// Todo id
        id: String,
        /// New text
        text: String,
    },
    /// Delete a todo
    Delete {
        /// Todo id
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo=info,synced_todo_runtime=info,synced_todo_firebase=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut exporter = MetricsExporter::new();
    if cli.metrics {
        exporter.install().context("installing metrics recorder")?;
    }

    let mut config = TodoConfig::from_env().context("reading todo configuration")?;
    if let Some(collection) = cli.collection {
        config = config.with_collection(collection);
    }

    let provider = TodoProvider::new(TodoEnvironment::new(remote_store()?, config));

    match provider.activate().await {
        Ok(Activation::Hydrated { items }) => {
            tracing::info!(count = items.len(), "Loaded todos");
        },
        Ok(Activation::AlreadyActive) => {},
        Err(error) => {
            tracing::warn!(%error, "Could not load existing todos");
        },
    }

    match cli.command {
        Command::List => {},
        Command::Add { text } => {
            let item = provider.add_todo(&text).await?;
            println!("Added {}", item.id);
        },
        Command::Update { id, text } => {
            provider.update_todo(&id, &text).await?;
            println!("Updated {id}");
        },
        Command::Delete { id } => {
            provider.delete_todo(&id).await?;
            println!("Deleted {id}");
        },
    }

    let todos = provider.todos().await;
    if todos.is_empty() {
        println!("No todos.");
    }
    for todo in &todos {
        println!("  {}  {}", todo.id, todo.text);
    }

    provider.dispose_default().await.context("shutting down store")?;

    if let Some(rendered) = exporter.render() {
        println!("\n{rendered}");
    }

    Ok(())
}

fn remote_store() -> anyhow::Result<Arc<dyn RemoteStore>> {
    if std::env::var_os(DATABASE_URL_VAR).is_none() {
        tracing::info!("{DATABASE_URL_VAR} not set, using an in-memory store");
        return Ok(Arc::new(InMemoryRemoteStore::new()));
    }

    let config = FirebaseConfig::from_env().context("reading Firebase configuration")?;
    tracing::info!(url = %config.database_url, "Using Firebase Realtime Database");
    Ok(Arc::new(FirebaseStore::new(config)?))
}
