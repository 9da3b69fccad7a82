//! Core of the snipshelf snippet library.
//!
//! Groups and snippet categories live in two document collections behind an
//! async store contract; a `Session` owns the connection handshake, the
//! stores and the in-memory caches handed to presentation.

pub mod cache;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod session;
pub mod store;

pub use cache::{CollectionCache, Snapshot};
pub use config::{AppConfig, ConfigError, LoggingConfig, StorageConfig};
pub use db::{DbError, DbHandle};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::group::{Group, DEFAULT_GROUP_NAME};
pub use model::snippet::{
    ContentBlock, Snippet, SnippetBucket, SnippetCategory, SnippetDraft, SnippetIdGenerator,
};
pub use model::validation::{NameField, ValidationError, MAX_NAME_CHARS};
pub use service::group_service::GroupService;
pub use service::snippet_service::SnippetService;
pub use service::{Feedback, ServiceError, ServiceResult};
pub use session::{ConnectionState, HandshakeError, Session};
pub use store::{
    Collection, Document, EngineError, SqliteStore, Store, StoreError, StoreErrorKind,
    StoreResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
