//! In-memory mirror of one collection.
//!
//! # Responsibility
//! - Hold the last full `find_all` result for presentation.
//! - Notify subscribers after each snapshot swap.
//!
//! # Invariants
//! - A snapshot is only ever replaced as a whole; readers see either the
//!   previous or the next collection state, never a mix.
//! - A failed reload keeps the previous snapshot.

use crate::store::{Document, Store, StoreResult};
use std::sync::Arc;
use tokio::sync::watch;

pub type Snapshot<D> = Arc<Vec<D>>;

pub struct CollectionCache<D> {
    tx: watch::Sender<Snapshot<D>>,
}

impl<D: Document> CollectionCache<D> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Vec::new()));
        Self { tx }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Snapshot<D> {
        self.tx.borrow().clone()
    }

    /// Receiver that observes every subsequent snapshot swap.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<D>> {
        self.tx.subscribe()
    }

    /// Re-reads the whole collection from `store` and swaps it in.
    pub async fn reload<S: Store<D>>(&self, store: &S) -> StoreResult<Snapshot<D>> {
        let docs = store.find_all().await?;
        Ok(self.replace(docs))
    }

    /// Swaps in an already loaded collection.
    pub fn replace(&self, docs: Vec<D>) -> Snapshot<D> {
        let docs = Arc::new(docs);
        self.tx.send_replace(docs.clone());
        docs
    }
}

impl<D: Document> Default for CollectionCache<D> {
    fn default() -> Self {
        Self::new()
    }
}
