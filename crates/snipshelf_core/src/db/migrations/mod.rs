//! Schema migration registry and executor.
//!
//! # Invariants
//! - `version` values are strictly increasing.
//! - Every migration is idempotent (check-before-create), so a partially
//!   applied database can be migrated again safely.
//! - The applied version is mirrored to `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_init.sql"),
}];

/// Returns the latest schema version this binary can create.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Migrates `conn` to exactly `target` inside one immediate transaction.
///
/// # Errors
/// - `UnknownSchemaVersion` when `target` is zero or above [`latest_version`].
/// - `Downgrade` when the stored version is already above `target`.
/// - `Busy` when another connection holds the write lock.
pub fn apply_migrations(conn: &mut Connection, target: u32) -> DbResult<()> {
    let latest = latest_version();
    if target == 0 || target > latest {
        return Err(DbError::UnknownSchemaVersion {
            requested: target,
            latest_supported: latest,
        });
    }

    let current = current_user_version(conn)?;
    if current > target {
        return Err(DbError::Downgrade {
            db_version: current,
            requested: target,
        });
    }
    if current == target {
        return Ok(());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    for migration in MIGRATIONS {
        if migration.version <= current || migration.version > target {
            continue;
        }
        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        info!(
            "event=db_migrate module=db status=ok version={}",
            migration.version
        );
    }
    tx.commit()?;

    Ok(())
}

/// Reads `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
