//! Transaction scope over one collection.
//!
//! A `TxScope` wraps a single SQLite transaction and is the only place where
//! engine errors are turned into `StoreError`. Dropping a scope without
//! calling `commit` rolls it back.

use super::{Collection, Document, StoreError, StoreResult};
use rusqlite::{ffi, Connection, ErrorCode, OptionalExtension, Transaction, TransactionBehavior};
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TxMode {
    Read,
    Write,
}

pub(crate) struct TxScope<'conn, D> {
    tx: Transaction<'conn>,
    collection: Collection,
    _doc: PhantomData<fn() -> D>,
}

impl<'conn, D: Document> TxScope<'conn, D> {
    /// Reads take a deferred transaction; writes take the write lock up front
    /// so a read-modify-write cannot interleave with another writer.
    pub(crate) fn begin(conn: &'conn mut Connection, mode: TxMode) -> StoreResult<Self> {
        let behavior = match mode {
            TxMode::Read => TransactionBehavior::Deferred,
            TxMode::Write => TransactionBehavior::Immediate,
        };
        let tx = conn
            .transaction_with_behavior(behavior)
            .map_err(|err| StoreError::engine(D::COLLECTION, err))?;
        Ok(Self {
            tx,
            collection: D::COLLECTION,
            _doc: PhantomData,
        })
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn get(&self, key: &str) -> StoreResult<Option<D>> {
        let sql = format!("SELECT doc FROM {} WHERE name = ?1;", self.table());
        let text: Option<String> = self
            .tx
            .query_row(&sql, [key], |row| row.get(0))
            .optional()
            .map_err(|err| self.engine(err))?;
        text.map(|text| self.decode(&text)).transpose()
    }

    /// All documents ordered by insertion.
    pub fn scan(&self) -> StoreResult<Vec<D>> {
        let sql = format!("SELECT doc FROM {} ORDER BY seq ASC;", self.table());
        let mut stmt = self.tx.prepare(&sql).map_err(|err| self.engine(err))?;
        let texts = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .map_err(|err| self.engine(err))?;
        texts.iter().map(|text| self.decode(text)).collect()
    }

    /// Inserts `doc`; an existing key is reported as `DuplicateKey`.
    pub fn insert(&self, doc: &D) -> StoreResult<()> {
        let sql = format!("INSERT INTO {} (name, doc) VALUES (?1, ?2);", self.table());
        let text = self.encode(doc)?;
        self.tx
            .execute(&sql, [doc.key(), text.as_str()])
            .map_err(|err| {
                if is_key_violation(&err) {
                    StoreError::DuplicateKey {
                        collection: self.collection,
                        key: doc.key().to_string(),
                    }
                } else {
                    self.engine(err)
                }
            })?;
        Ok(())
    }

    /// Inserts or fully replaces `doc`. A replaced document keeps its
    /// insertion position.
    pub fn put(&self, doc: &D) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO {} (name, doc) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET doc = excluded.doc;",
            self.table()
        );
        let text = self.encode(doc)?;
        self.tx
            .execute(&sql, [doc.key(), text.as_str()])
            .map_err(|err| self.engine(err))?;
        Ok(())
    }

    /// Deletes `key`. Returns whether a document was removed.
    pub fn remove(&self, key: &str) -> StoreResult<bool> {
        let sql = format!("DELETE FROM {} WHERE name = ?1;", self.table());
        let changed = self
            .tx
            .execute(&sql, [key])
            .map_err(|err| self.engine(err))?;
        Ok(changed > 0)
    }

    pub fn commit(self) -> StoreResult<()> {
        let collection = self.collection;
        self.tx
            .commit()
            .map_err(|err| StoreError::engine(collection, err))
    }

    fn table(&self) -> &'static str {
        self.collection.table()
    }

    fn encode(&self, doc: &D) -> StoreResult<String> {
        serde_json::to_string(doc).map_err(|err| self.engine(err))
    }

    fn decode(&self, text: &str) -> StoreResult<D> {
        serde_json::from_str(text).map_err(|err| self.engine(err))
    }

    fn engine(&self, err: impl Into<super::EngineError>) -> StoreError {
        StoreError::engine(self.collection, err)
    }
}

fn is_key_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(inner, _) => {
            inner.code == ErrorCode::ConstraintViolation
                && matches!(
                    inner.extended_code,
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                )
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{is_key_violation, TxMode, TxScope};
    use crate::model::group::Group;
    use crate::store::StoreErrorKind;
    use rusqlite::Connection;

    fn groups_table() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE groups (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                doc TEXT NOT NULL
            );",
        )
        .unwrap();
        conn
    }

    #[test]
    fn unique_violation_is_classified_as_key_violation() {
        let conn = groups_table();
        conn.execute("INSERT INTO groups (name, doc) VALUES ('a', '{}');", [])
            .unwrap();
        let err = conn
            .execute("INSERT INTO groups (name, doc) VALUES ('a', '{}');", [])
            .unwrap_err();
        assert!(is_key_violation(&err));

        let not_null = conn
            .execute("INSERT INTO groups (name, doc) VALUES ('b', NULL);", [])
            .unwrap_err();
        assert!(!is_key_violation(&not_null));
    }

    #[test]
    fn dropped_scope_rolls_back() {
        let mut conn = groups_table();
        {
            let scope = TxScope::<Group>::begin(&mut conn, TxMode::Write).unwrap();
            scope.insert(&Group::new("Work")).unwrap();
        }
        let scope = TxScope::<Group>::begin(&mut conn, TxMode::Read).unwrap();
        assert!(scope.get("Work").unwrap().is_none());
    }

    #[test]
    fn undecodable_row_is_a_storage_error() {
        let mut conn = groups_table();
        conn.execute("INSERT INTO groups (name, doc) VALUES ('x', 'not json');", [])
            .unwrap();
        let scope = TxScope::<Group>::begin(&mut conn, TxMode::Read).unwrap();
        let err = scope.get("x").unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::Storage);
    }
}
