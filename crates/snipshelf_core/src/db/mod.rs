//! SQLite storage bootstrap and connection handshake.
//!
//! # Responsibility
//! - Open and configure the SQLite connection backing every store.
//! - Apply schema migrations up to the requested version.
//! - Classify handshake failures into blocking vs. terminal outcomes.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - No store touches application data before migrations succeed.

use rusqlite::ErrorCode;
use thiserror::Error;

mod handle;
pub mod migrations;
mod open;

pub use handle::{DbHandle, SharedConnection};
pub use open::{open_configured, open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Outcome of a failed connection handshake.
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(rusqlite::Error),
    /// Another connection holds the database lock.
    #[error("database is locked by another connection")]
    Busy,
    /// The file was already upgraded past the version this instance asked for.
    #[error("database schema version {db_version} is newer than requested {requested}")]
    Downgrade { db_version: u32, requested: u32 },
    #[error("schema version {requested} is not supported (latest known: {latest_supported})")]
    UnknownSchemaVersion {
        requested: u32,
        latest_supported: u32,
    },
}

impl DbError {
    /// Whether the failure is resolved by closing other instances rather
    /// than being a hard error.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Busy | Self::Downgrade { .. })
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        match value.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => Self::Busy,
            _ => Self::Sqlite(value),
        }
    }
}
