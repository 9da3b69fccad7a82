//! SQLite-backed implementation of the `Store` contract.
//!
//! # Responsibility
//! - Run every operation on the blocking pool so async callers never block.
//! - Open exactly one `TxScope` per operation and commit it on success.
//! - Emit `store_op` logging events with duration and outcome.
//!
//! # Invariants
//! - The connection handle is checked before any engine work is scheduled.
//! - `find_one_and_update` reads and writes under the same immediate
//!   transaction while holding the session's connection lock, so concurrent
//!   read-modify-writes on one key are serialized.

use super::scope::{TxMode, TxScope};
use super::{Collection, Document, Store, StoreError, StoreErrorKind, StoreResult};
use crate::db::{DbHandle, SharedConnection};
use async_trait::async_trait;
use log::{debug, error, warn};
use std::marker::PhantomData;
use std::time::Instant;

pub struct SqliteStore<D> {
    handle: DbHandle,
    _doc: PhantomData<fn() -> D>,
}

impl<D> Clone for SqliteStore<D> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            _doc: PhantomData,
        }
    }
}

impl<D: Document> SqliteStore<D> {
    /// Creates a store over `handle`. The handle may still be empty.
    pub fn new(handle: DbHandle) -> Self {
        Self {
            handle,
            _doc: PhantomData,
        }
    }

    pub fn collection(&self) -> Collection {
        D::COLLECTION
    }

    fn connection(&self) -> StoreResult<SharedConnection> {
        self.handle.connection().ok_or(StoreError::NotConnected {
            collection: D::COLLECTION,
        })
    }

    async fn run<T, F>(&self, op: &'static str, mode: TxMode, work: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&TxScope<'_, D>) -> StoreResult<T> + Send + 'static,
    {
        let collection = D::COLLECTION;
        let conn = match self.connection() {
            Ok(conn) => conn,
            Err(err) => {
                warn!("event=store_op module=store op={op} collection={collection} status=error error_code=not_connected");
                return Err(err);
            }
        };

        let started_at = Instant::now();
        let result = tokio::task::spawn_blocking(move || -> StoreResult<T> {
            let mut guard = conn.lock();
            let scope = TxScope::<D>::begin(&mut *guard, mode)?;
            let value = work(&scope)?;
            scope.commit()?;
            Ok(value)
        })
        .await
        .unwrap_or_else(|join_err| Err(StoreError::engine(collection, join_err)));

        let duration_ms = started_at.elapsed().as_millis();
        match &result {
            Ok(_) => debug!(
                "event=store_op module=store op={op} collection={collection} status=ok duration_ms={duration_ms}"
            ),
            Err(err) if err.kind() == StoreErrorKind::Storage => error!(
                "event=store_op module=store op={op} collection={collection} status=error duration_ms={duration_ms} error_code=storage error={err}"
            ),
            Err(err) => warn!(
                "event=store_op module=store op={op} collection={collection} status=error duration_ms={duration_ms} error_code={} error={err}",
                error_code(err.kind())
            ),
        }
        result
    }
}

#[async_trait]
impl<D: Document> Store<D> for SqliteStore<D> {
    async fn add(&self, doc: D) -> StoreResult<D> {
        self.run("add", TxMode::Write, move |scope| {
            scope.insert(&doc)?;
            Ok(doc)
        })
        .await
    }

    async fn find_all(&self) -> StoreResult<Vec<D>> {
        self.run("find_all", TxMode::Read, |scope| scope.scan()).await
    }

    async fn find_by_key(&self, key: &str) -> StoreResult<Option<D>> {
        let key = key.to_owned();
        self.run("find_by_key", TxMode::Read, move |scope| scope.get(&key))
            .await
    }

    async fn update(&self, doc: D) -> StoreResult<D> {
        self.run("update", TxMode::Write, move |scope| {
            scope.put(&doc)?;
            Ok(doc)
        })
        .await
    }

    async fn find_one_and_update<F>(&self, key: &str, mutate: F) -> StoreResult<D>
    where
        F: FnOnce(D) -> D + Send + 'static,
    {
        let key = key.to_owned();
        self.run("find_one_and_update", TxMode::Write, move |scope| {
            let current = scope.get(&key)?.ok_or_else(|| StoreError::NotFound {
                collection: scope.collection(),
                key: key.clone(),
            })?;

            let next = mutate(current);
            if next.key() != key {
                return Err(StoreError::KeyMismatch {
                    collection: scope.collection(),
                    expected: key,
                    actual: next.key().to_string(),
                });
            }

            scope.put(&next)?;
            Ok(next)
        })
        .await
    }

    async fn delete(&self, key: &str) -> StoreResult<String> {
        let key = key.to_owned();
        self.run("delete", TxMode::Write, move |scope| {
            scope.remove(&key)?;
            Ok(key)
        })
        .await
    }
}

fn error_code(kind: StoreErrorKind) -> &'static str {
    match kind {
        StoreErrorKind::NotConnected => "not_connected",
        StoreErrorKind::DuplicateKey => "duplicate_key",
        StoreErrorKind::NotFound => "not_found",
        StoreErrorKind::Storage => "storage",
    }
}
