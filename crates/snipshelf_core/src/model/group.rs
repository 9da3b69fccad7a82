//! Group document.
//!
//! Groups are plain labels that snippets point at by name. There is no
//! referential integrity between a snippet's `group` and this collection.

use super::validation::{validate_name, NameField, ValidationResult};
use serde::{Deserialize, Serialize};

/// Name of the group inserted when the database is first created.
pub const DEFAULT_GROUP_NAME: &str = "Common";

/// A named label used to bucket snippets inside a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Checks the user-facing constraints on a group before it is written.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name(NameField::Group, &self.name)
    }
}
