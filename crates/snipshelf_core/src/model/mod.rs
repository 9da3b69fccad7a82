//! Snippet library domain model.
//!
//! # Responsibility
//! - Define the persisted document shapes (`Group`, `SnippetCategory`).
//! - Define nested, non-persisted-on-their-own values (`Snippet`, `ContentBlock`).
//! - Own input validation shared by every write path.
//!
//! # Invariants
//! - Every top-level document is addressed by its `name`.
//! - Snippets only exist embedded inside exactly one category.

pub mod group;
pub mod snippet;
pub mod validation;
