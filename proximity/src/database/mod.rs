//! Database module
//!
//! Reminder persistence on SQLite:
//! - Schema and migrations
//! - Model definitions
//! - Repository layer for reminder reads and writes

pub mod models;
pub mod repository;
pub mod schema;

pub use models::*;
pub use repository::Repository;
pub use schema::initialize_database;

use crate::config;
use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;

/// WAL lets the region event loop read while an edit is being written.
fn connect_options(db_path: &Path) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(config::DATABASE_BUSY_TIMEOUT_SECS))
        .journal_mode(SqliteJournalMode::Wal)
}

/// Open the reminders database, migrating it first.
///
/// Migrations run on their own connection, closed before the shared pool
/// opens.
pub async fn create_pool(db_path: &Path) -> Result<SqlitePool> {
    tracing::info!("Opening reminders database at {:?}", db_path);

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = connect_options(db_path);

    let migration_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options.clone())
        .await?;
    initialize_database(&migration_pool).await?;
    migration_pool.close().await;

    let pool = SqlitePoolOptions::new()
        .max_connections(config::DATABASE_MAX_CONNECTIONS)
        .connect_with(options)
        .await?;

    Ok(pool)
}
