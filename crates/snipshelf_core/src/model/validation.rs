//! Input validation for documents written by the services.
//!
//! # Invariants
//! - Names are required after trimming and at most [`MAX_NAME_CHARS`] long.
//! - A snippet carries at least one non-blank content block.

use thiserror::Error;

/// Maximum number of characters accepted in any user-entered name.
pub const MAX_NAME_CHARS: usize = 255;

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Which name a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameField {
    Group,
    Category,
    Snippet,
}

impl NameField {
    /// Form field identifier used for field-level feedback.
    pub fn field_id(self) -> &'static str {
        match self {
            Self::Group => "groupName",
            Self::Category => "categoryName",
            Self::Snippet => "snippetName",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Group => "Group name",
            Self::Category => "Category name",
            Self::Snippet => "Snippet name",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{} is required", .0.label())]
    MissingName(NameField),
    #[error("{} must be less than {} characters", .field.label(), MAX_NAME_CHARS)]
    NameTooLong { field: NameField, chars: usize },
    #[error("Group is required")]
    MissingGroup,
    #[error("at least one content block is required")]
    EmptyContent,
    #[error("Content is required (block {index})")]
    BlankContentBlock { index: usize },
}

impl ValidationError {
    /// Form field the error belongs to.
    pub fn field_id(&self) -> String {
        match self {
            Self::MissingName(field) | Self::NameTooLong { field, .. } => {
                field.field_id().to_string()
            }
            Self::MissingGroup => "groupName".to_string(),
            Self::EmptyContent => "contents".to_string(),
            Self::BlankContentBlock { index } => format!("contents.{index}.value"),
        }
    }
}

pub(crate) fn validate_name(field: NameField, name: &str) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::MissingName(field));
    }
    let chars = name.chars().count();
    if chars > MAX_NAME_CHARS {
        return Err(ValidationError::NameTooLong { field, chars });
    }
    Ok(())
}
