//! Document store contract and its SQLite implementation.
//!
//! # Responsibility
//! - Define the async CRUD + read-modify-write contract every collection
//!   store satisfies.
//! - Translate engine failures into a closed set of error kinds at the
//!   transaction boundary so callers never inspect engine diagnostics.
//!
//! # Invariants
//! - Every operation runs inside exactly one transaction on one collection.
//! - Every operation fails fast with `NotConnected` before the handshake.

use async_trait::async_trait;
use thiserror::Error;

pub mod collection;
mod scope;
pub mod sqlite_store;

pub use collection::{Collection, Document};
pub use sqlite_store::SqliteStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Async document store over one collection keyed by `Document::key`.
#[async_trait]
pub trait Store<D: Document>: Send + Sync {
    /// Inserts a new document. Fails with `DuplicateKey` when the key exists.
    async fn add(&self, doc: D) -> StoreResult<D>;

    /// Returns every document in insertion order.
    async fn find_all(&self) -> StoreResult<Vec<D>>;

    /// Point lookup. A missing key is `Ok(None)`, not an error.
    async fn find_by_key(&self, key: &str) -> StoreResult<Option<D>>;

    /// Replaces the document stored under the same key.
    async fn update(&self, doc: D) -> StoreResult<D>;

    /// Reads `key`, applies `mutate` and writes the result back, all in one
    /// write transaction.
    ///
    /// Fails with `NotFound` (and writes nothing) when `key` is absent.
    /// `mutate` must return a complete document carrying the same key.
    async fn find_one_and_update<F>(&self, key: &str, mutate: F) -> StoreResult<D>
    where
        F: FnOnce(D) -> D + Send + 'static;

    /// Removes the document under `key` and returns the key.
    async fn delete(&self, key: &str) -> StoreResult<String>;
}

/// Coarse classification of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    NotConnected,
    DuplicateKey,
    NotFound,
    Storage,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage engine is not connected (collection `{collection}`)")]
    NotConnected { collection: Collection },
    #[error("document `{key}` already exists in `{collection}`")]
    DuplicateKey { collection: Collection, key: String },
    #[error("document with key `{key}` is not found in `{collection}`")]
    NotFound { collection: Collection, key: String },
    #[error("mutation changed document key `{expected}` to `{actual}` in `{collection}`")]
    KeyMismatch {
        collection: Collection,
        expected: String,
        actual: String,
    },
    #[error("storage failure in `{collection}`: {source}")]
    Storage {
        collection: Collection,
        #[source]
        source: EngineError,
    },
}

/// Diagnostic carried by [`StoreError::Storage`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("document codec: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("storage task did not complete: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StoreError {
    pub(crate) fn engine(collection: Collection, source: impl Into<EngineError>) -> Self {
        Self::Storage {
            collection,
            source: source.into(),
        }
    }

    pub fn kind(&self) -> StoreErrorKind {
        match self {
            Self::NotConnected { .. } => StoreErrorKind::NotConnected,
            Self::DuplicateKey { .. } => StoreErrorKind::DuplicateKey,
            Self::NotFound { .. } => StoreErrorKind::NotFound,
            Self::KeyMismatch { .. } | Self::Storage { .. } => StoreErrorKind::Storage,
        }
    }

    pub fn collection(&self) -> Collection {
        match self {
            Self::NotConnected { collection }
            | Self::DuplicateKey { collection, .. }
            | Self::NotFound { collection, .. }
            | Self::KeyMismatch { collection, .. }
            | Self::Storage { collection, .. } => *collection,
        }
    }
}
