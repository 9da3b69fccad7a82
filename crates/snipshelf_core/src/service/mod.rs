//! Use-case services over the document stores.
//!
//! # Responsibility
//! - Validate input before any store write.
//! - Reload the affected collection cache after every successful mutation.
//! - Map failures to field-level or generic user feedback.
//!
//! # Invariants
//! - Services never touch the engine except through the `Store` contract.

use crate::model::validation::ValidationError;
use crate::store::{Collection, StoreError};
use thiserror::Error;

pub mod group_service;
pub mod snippet_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Message shown for every failure that has no field to attach to.
pub const GENERIC_FAILURE_NOTICE: &str = "Something went wrong";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Target category does not exist.
    #[error("category not found: {0}")]
    CategoryNotFound(String),
    #[error(transparent)]
    Store(StoreError),
    /// Write succeeded but the read-back does not contain what was written.
    #[error("inconsistent state: {0}")]
    InconsistentState(&'static str),
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound {
                collection: Collection::SnippetCategories,
                key,
            } => Self::CategoryNotFound(key),
            other => Self::Store(other),
        }
    }
}

/// How a failure should be presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// Attach `message` to the form field `field`.
    Field { field: String, message: String },
    /// Show a generic notice.
    Notice(&'static str),
}

impl ServiceError {
    pub fn feedback(&self) -> Feedback {
        match self {
            Self::Validation(err) => Feedback::Field {
                field: err.field_id(),
                message: err.to_string(),
            },
            Self::Store(StoreError::DuplicateKey { collection, .. }) => {
                let (field, label) = match collection {
                    Collection::Groups => ("groupName", "Group name"),
                    Collection::SnippetCategories => ("categoryName", "Category name"),
                };
                Feedback::Field {
                    field: field.to_string(),
                    message: format!("{label} already exists"),
                }
            }
            _ => Feedback::Notice(GENERIC_FAILURE_NOTICE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Feedback, ServiceError, GENERIC_FAILURE_NOTICE};
    use crate::model::validation::{NameField, ValidationError};
    use crate::store::{Collection, StoreError};

    #[test]
    fn duplicate_category_maps_to_category_field() {
        let err = ServiceError::from(StoreError::DuplicateKey {
            collection: Collection::SnippetCategories,
            key: "Shell".into(),
        });
        assert_eq!(
            err.feedback(),
            Feedback::Field {
                field: "categoryName".into(),
                message: "Category name already exists".into(),
            }
        );
    }

    #[test]
    fn missing_category_becomes_category_not_found() {
        let err = ServiceError::from(StoreError::NotFound {
            collection: Collection::SnippetCategories,
            key: "Shell".into(),
        });
        assert!(matches!(&err, ServiceError::CategoryNotFound(name) if name == "Shell"));
        assert_eq!(err.feedback(), Feedback::Notice(GENERIC_FAILURE_NOTICE));
    }

    #[test]
    fn validation_maps_to_its_field() {
        let err = ServiceError::from(ValidationError::MissingName(NameField::Group));
        assert_eq!(
            err.feedback(),
            Feedback::Field {
                field: "groupName".into(),
                message: "Group name is required".into(),
            }
        );
    }
}
