//! Group use-case service.
//!
//! # Invariants
//! - Group names are trimmed at every entry point, so lookups match storage.
//! - The group cache is reloaded after every successful write.

use super::ServiceResult;
use crate::cache::{CollectionCache, Snapshot};
use crate::model::group::Group;
use crate::store::{Store, StoreResult};
use log::info;
use tokio::sync::watch;

pub struct GroupService<S: Store<Group>> {
    store: S,
    cache: CollectionCache<Group>,
}

impl<S: Store<Group>> GroupService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: CollectionCache::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Cached groups in insertion order.
    pub fn groups(&self) -> Snapshot<Group> {
        self.cache.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<Group>> {
        self.cache.subscribe()
    }

    pub async fn reload(&self) -> StoreResult<Snapshot<Group>> {
        self.cache.reload(&self.store).await
    }

    /// Publishes a collection loaded outside the service's own store.
    pub(crate) fn publish(&self, docs: Vec<Group>) -> Snapshot<Group> {
        self.cache.replace(docs)
    }

    /// Creates a group. A taken name fails with a duplicate-key store error.
    pub async fn add_group(&self, name: &str) -> ServiceResult<Group> {
        let group = Group::new(name.trim());
        group.validate()?;

        let group = self.store.add(group).await?;
        self.reload().await?;
        info!("event=group_add module=service status=ok");
        Ok(group)
    }

    pub async fn delete_group(&self, name: &str) -> ServiceResult<String> {
        let key = self.store.delete(name.trim()).await?;
        self.reload().await?;
        info!("event=group_delete module=service status=ok");
        Ok(key)
    }
}
