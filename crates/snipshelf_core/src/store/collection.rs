//! Collection registry.
//!
//! The set of collections is fixed. Each one maps a public collection name to
//! its backing table and to the document type stored in it.

use crate::model::group::Group;
use crate::model::snippet::SnippetCategory;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Groups,
    SnippetCategories,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Groups, Collection::SnippetCategories];

    /// Public collection name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Groups => "groups",
            Self::SnippetCategories => "snippetCategories",
        }
    }

    pub(crate) fn table(self) -> &'static str {
        match self {
            Self::Groups => "groups",
            Self::SnippetCategories => "snippet_categories",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A record stored as one unit in a collection, addressed by a natural key.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn key(&self) -> &str;
}

impl Document for Group {
    const COLLECTION: Collection = Collection::Groups;

    fn key(&self) -> &str {
        &self.name
    }
}

impl Document for SnippetCategory {
    const COLLECTION: Collection = Collection::SnippetCategories;

    fn key(&self) -> &str {
        &self.name
    }
}
