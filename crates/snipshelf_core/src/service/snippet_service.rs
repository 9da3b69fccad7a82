//! Snippet category use-case service.
//!
//! # Responsibility
//! - Create and delete categories.
//! - Create, edit and delete snippets through read-modify-write on the
//!   owning category.
//! - Persist the category `expand` UI flag.
//!
//! # Invariants
//! - Snippets are never written outside their owning category document.
//! - The category cache is reloaded after every successful write.
//! - Category names are trimmed at every entry point, so lookups match storage.

use super::{ServiceError, ServiceResult};
use crate::cache::{CollectionCache, Snapshot};
use crate::model::snippet::{Snippet, SnippetBucket, SnippetCategory, SnippetDraft, SnippetIdGenerator};
use crate::store::{Store, StoreResult};
use log::info;
use tokio::sync::watch;

pub struct SnippetService<S: Store<SnippetCategory>> {
    store: S,
    cache: CollectionCache<SnippetCategory>,
    ids: SnippetIdGenerator,
}

impl<S: Store<SnippetCategory>> SnippetService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: CollectionCache::new(),
            ids: SnippetIdGenerator::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Cached categories in insertion order.
    pub fn categories(&self) -> Snapshot<SnippetCategory> {
        self.cache.snapshot()
    }

    /// Cached category by name.
    pub fn category(&self, name: &str) -> Option<SnippetCategory> {
        self.cache
            .snapshot()
            .iter()
            .find(|category| category.name == name.trim())
            .cloned()
    }

    /// Snippets of a cached category bucketed by group.
    pub fn grouped_snippets(&self, category: &str) -> Option<Vec<SnippetBucket>> {
        self.category(category)
            .map(|category| category.grouped_snippets())
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<SnippetCategory>> {
        self.cache.subscribe()
    }

    pub async fn reload(&self) -> StoreResult<Snapshot<SnippetCategory>> {
        self.cache.reload(&self.store).await
    }

    /// Publishes a collection loaded outside the service's own store.
    pub(crate) fn publish(&self, docs: Vec<SnippetCategory>) -> Snapshot<SnippetCategory> {
        self.cache.replace(docs)
    }

    /// Creates an empty category.
    pub async fn add_category(&self, name: &str) -> ServiceResult<SnippetCategory> {
        let category = SnippetCategory::new(name.trim());
        category.validate()?;

        let category = self.store.add(category).await?;
        self.reload().await?;
        info!("event=category_add module=service status=ok");
        Ok(category)
    }

    /// Deletes a category together with every snippet it owns.
    pub async fn delete_category(&self, name: &str) -> ServiceResult<String> {
        let key = self.store.delete(name.trim()).await?;
        self.reload().await?;
        info!("event=category_delete module=service status=ok");
        Ok(key)
    }

    pub async fn set_category_expanded(
        &self,
        name: &str,
        expanded: bool,
    ) -> ServiceResult<SnippetCategory> {
        let category = self
            .store
            .find_one_and_update(name.trim(), move |mut category| {
                category.expand = Some(expanded);
                category
            })
            .await?;
        self.reload().await?;
        Ok(category)
    }

    /// Creates or edits a snippet inside `category`.
    ///
    /// # Contract
    /// - A draft whose `id` exists in the category edits that snippet in place.
    /// - Any other draft is appended with a freshly generated id.
    /// - Returns the snippet as persisted.
    pub async fn save_snippet(
        &self,
        category: &str,
        draft: SnippetDraft,
    ) -> ServiceResult<Snippet> {
        draft.validate()?;

        let requested_id = draft.id.clone();
        let new_id = self.ids.next_id();
        let updated = self
            .store
            .find_one_and_update(category.trim(), move |mut doc| {
                doc.apply_draft(draft, new_id);
                doc
            })
            .await?;
        self.reload().await?;

        // A draft that did not match an existing id was appended last.
        let snippet = requested_id
            .and_then(|id| updated.find_snippet(&id).cloned())
            .or_else(|| updated.snippets.last().cloned())
            .ok_or(ServiceError::InconsistentState(
                "saved snippet missing from category",
            ))?;
        info!("event=snippet_save module=service status=ok");
        Ok(snippet)
    }

    /// Removes snippet `id` from `category`. Unknown ids leave it unchanged.
    pub async fn delete_snippet(&self, category: &str, id: &str) -> ServiceResult<SnippetCategory> {
        let id = id.to_owned();
        let updated = self
            .store
            .find_one_and_update(category.trim(), move |mut doc| {
                doc.remove_snippet(&id);
                doc
            })
            .await?;
        self.reload().await?;
        info!("event=snippet_delete module=service status=ok");
        Ok(updated)
    }
}
