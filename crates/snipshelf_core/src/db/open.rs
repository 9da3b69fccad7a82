//! Connection bootstrap for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure the busy timeout from `StorageConfig`.
//! - Run migrations before handing the connection out.
//!
//! # Invariants
//! - Returned connections are at exactly `config.schema_version`.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use crate::config::StorageConfig;
use log::{error, info, warn};
use rusqlite::Connection;
use std::path::Path;
use std::time::Instant;

/// Opens the database described by `config` (file or in-memory).
pub fn open_configured(config: &StorageConfig) -> DbResult<Connection> {
    match config.path.as_deref() {
        Some(path) => open_db(path, config),
        None => open_db_in_memory(config),
    }
}

/// Opens a SQLite database file and migrates it to the requested version.
///
/// # Side effects
/// - Creates the file when missing.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>, config: &StorageConfig) -> DbResult<Connection> {
    let path = path.as_ref();
    open_with("file", config, || Connection::open(path))
}

/// Opens a fresh in-memory database and migrates it.
pub fn open_db_in_memory(config: &StorageConfig) -> DbResult<Connection> {
    open_with("memory", config, Connection::open_in_memory)
}

fn open_with(
    mode: &str,
    config: &StorageConfig,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!(
        "event=db_open module=db status=start mode={mode} schema_version={}",
        config.schema_version
    );

    let result = connect()
        .map_err(DbError::from)
        .and_then(|mut conn| bootstrap_connection(&mut conn, config).map(|()| conn));

    let duration_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(_) => info!("event=db_open module=db status=ok mode={mode} duration_ms={duration_ms}"),
        Err(err) if err.is_blocking() => warn!(
            "event=db_open module=db status=blocked mode={mode} duration_ms={duration_ms} error={err}"
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={duration_ms} error={err}"
        ),
    }
    result
}

fn bootstrap_connection(conn: &mut Connection, config: &StorageConfig) -> DbResult<()> {
    conn.busy_timeout(config.busy_timeout())?;
    apply_migrations(conn, config.schema_version)
}
