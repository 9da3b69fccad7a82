//! Application session: connection handshake plus the services built on it.
//!
//! # Responsibility
//! - Own the connection handle, both services and their caches.
//! - Run the open/migrate handshake once and record its outcome.
//!
//! # Invariants
//! - Services exist before the handshake; until it succeeds every store
//!   operation fails with `NotConnected`. A handshake whose initial load
//!   fails leaves the shared handle empty.
//! - `Blocked` and `Failed` are terminal: `connect` never retries.

use crate::config::StorageConfig;
use crate::db::{open_configured, DbHandle};
use crate::model::group::Group;
use crate::model::snippet::SnippetCategory;
use crate::service::group_service::GroupService;
use crate::service::snippet_service::SnippetService;
use crate::store::{SqliteStore, Store};
use log::{error, info, warn};
use thiserror::Error;

/// Shown when another instance still holds an older schema.
pub const BLOCKED_NOTICE: &str = "The internal database has been updated, but an old instance is still running. Close all other instances and open the application again.";

/// Shown for any other handshake failure.
pub const FAILED_NOTICE: &str =
    "Something went wrong while connecting the database. Please try again later";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Ready,
    Blocked(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandshakeError {
    #[error("database connection blocked: {reason}")]
    Blocked { reason: String },
    #[error("database connection failed: {reason}")]
    Failed { reason: String },
}

impl HandshakeError {
    /// Full-screen message for the presentation layer.
    pub fn notice(&self) -> &'static str {
        match self {
            Self::Blocked { .. } => BLOCKED_NOTICE,
            Self::Failed { .. } => FAILED_NOTICE,
        }
    }
}

pub type GroupStore = SqliteStore<Group>;
pub type CategoryStore = SqliteStore<SnippetCategory>;

pub struct Session {
    config: StorageConfig,
    handle: DbHandle,
    state: ConnectionState,
    groups: GroupService<GroupStore>,
    snippets: SnippetService<CategoryStore>,
}

impl Session {
    /// Builds a disconnected session. Call [`Session::connect`] before use.
    pub fn new(config: StorageConfig) -> Self {
        let handle = DbHandle::new();
        Self {
            config,
            groups: GroupService::new(SqliteStore::new(handle.clone())),
            snippets: SnippetService::new(SqliteStore::new(handle.clone())),
            handle,
            state: ConnectionState::Connecting,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::Ready
    }

    pub fn groups(&self) -> &GroupService<GroupStore> {
        &self.groups
    }

    pub fn snippets(&self) -> &SnippetService<CategoryStore> {
        &self.snippets
    }

    /// Opens and migrates the database, then loads both caches.
    ///
    /// Calling this again after success is a no-op; after failure it
    /// returns the recorded failure without touching the engine.
    pub async fn connect(&mut self) -> Result<(), HandshakeError> {
        match &self.state {
            ConnectionState::Ready => return Ok(()),
            ConnectionState::Blocked(reason) => {
                return Err(HandshakeError::Blocked {
                    reason: reason.clone(),
                })
            }
            ConnectionState::Failed(reason) => {
                return Err(HandshakeError::Failed {
                    reason: reason.clone(),
                })
            }
            ConnectionState::Connecting => {}
        }

        let outcome = self.handshake().await;
        self.state = match &outcome {
            Ok(()) => {
                info!("event=session_connect module=session status=ok");
                ConnectionState::Ready
            }
            Err(HandshakeError::Blocked { reason }) => {
                warn!("event=session_connect module=session status=blocked error={reason}");
                ConnectionState::Blocked(reason.clone())
            }
            Err(HandshakeError::Failed { reason }) => {
                error!("event=session_connect module=session status=error error={reason}");
                ConnectionState::Failed(reason.clone())
            }
        };
        outcome
    }

    async fn handshake(&self) -> Result<(), HandshakeError> {
        let config = self.config.clone();
        let conn = tokio::task::spawn_blocking(move || open_configured(&config))
            .await
            .map_err(|err| HandshakeError::Failed {
                reason: err.to_string(),
            })?
            .map_err(|err| {
                let reason = err.to_string();
                if err.is_blocking() {
                    HandshakeError::Blocked { reason }
                } else {
                    HandshakeError::Failed { reason }
                }
            })?;

        // Both collections are read through a staged handle. Caches and the
        // shared handle are only touched once both reads succeeded.
        let staged = DbHandle::connected(conn);
        let group_store = GroupStore::new(staged.clone());
        let category_store = CategoryStore::new(staged.clone());
        let (groups, categories) =
            tokio::try_join!(group_store.find_all(), category_store.find_all()).map_err(
                |err| HandshakeError::Failed {
                    reason: err.to_string(),
                },
            )?;

        self.groups.publish(groups);
        self.snippets.publish(categories);
        if let Some(conn) = staged.connection() {
            self.handle.attach_shared(conn);
        }
        Ok(())
    }
}
