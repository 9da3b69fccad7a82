//! Shared slot for the opened connection.
//!
//! Stores are built before the handshake finishes. They all hold a clone of
//! the same `DbHandle`, which stays empty until `attach` is called once.

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::sync::Arc;

/// Connection shared by every store of a session.
pub type SharedConnection = Arc<Mutex<Connection>>;

#[derive(Debug, Clone, Default)]
pub struct DbHandle {
    slot: Arc<OnceCell<SharedConnection>>,
}

impl DbHandle {
    /// Creates an empty handle. Stores using it fail with `NotConnected`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handle that is already attached to `conn`.
    pub fn connected(conn: Connection) -> Self {
        let handle = Self::new();
        handle.attach(conn);
        handle
    }

    /// Attaches the opened connection. Returns `false` when a connection
    /// was already attached; the existing one is kept.
    pub fn attach(&self, conn: Connection) -> bool {
        self.attach_shared(Arc::new(Mutex::new(conn)))
    }

    /// Same as [`DbHandle::attach`] for a connection already shared elsewhere.
    pub fn attach_shared(&self, conn: SharedConnection) -> bool {
        self.slot.set(conn).is_ok()
    }

    pub fn connection(&self) -> Option<SharedConnection> {
        self.slot.get().cloned()
    }

    pub fn is_connected(&self) -> bool {
        self.slot.get().is_some()
    }
}
