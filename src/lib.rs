// src/lib.rs
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod http_handlers;
pub mod push;
pub mod registry;
pub mod repository;
pub mod routes;
pub mod socket_handlers;
pub mod state;
pub mod types;
pub mod versioning;

use anyhow::Context;
use config::Config;
use push::SocketIoChannel;
use registry::SubscriptionRegistry;
use repository::SettingsRepository;
use socketioxide::{extract::SocketRef, SocketIo};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub io: SocketIo,
    pub db_pool: SqlitePool,
    pub repository: state::SharedRepository,
    pub registry: state::SharedRegistry,
}

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "web_settings=info,tower_http=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Opens the SQLite pool and makes sure the schema exists.
pub async fn connect_database(database_url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    if let Some(path) = database_url.strip_prefix("sqlite:") {
        if !path.contains(":memory:") {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
                }
            }
        }
    }

    let db_opts = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid database URL: {database_url}"))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .pragma("busy_timeout", "5000");

    let db_pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(db_opts)
        .await
        .context("Failed to connect to SQLite database")?;
    repository::init_db(&db_pool)
        .await
        .context("Failed to initialize database schema")?;
    Ok(db_pool)
}

/// Wires repository, registry and dispatcher around an open pool. Must be
/// called inside a tokio runtime because it spawns the dispatcher task.
pub fn assemble_state(config: Arc<Config>, io: SocketIo, db_pool: SqlitePool) -> ServerState {
    let (events_tx, events_rx) = state::new_event_channel();
    let repository = Arc::new(SettingsRepository::with_events(db_pool.clone(), events_tx));
    let registry = Arc::new(SubscriptionRegistry::new(
        repository.clone(),
        Arc::new(SocketIoChannel::new(io.clone())),
    ));
    tokio::spawn(dispatcher::run_dispatcher(registry.clone(), events_rx));

    ServerState {
        config,
        io,
        db_pool,
        repository,
        registry,
    }
}

pub async fn setup_shared_state(config: Arc<Config>, io: SocketIo) -> anyhow::Result<ServerState> {
    let db_pool = connect_database(&config.database_url, config.max_db_connections).await?;
    info!("🗃️ [DB] Connected to {}", config.database_url);

    let state = assemble_state(config, io.clone(), db_pool);

    let socket_state = state.clone();
    io.ns("/", move |s: SocketRef| {
        let state = socket_state.clone();
        async move {
            socket_handlers::on_socket_connect(s, state).await;
        }
    });

    Ok(state)
}
