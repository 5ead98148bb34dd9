//! Connection registry: the only shared mutable state in the core.
//!
//! Tracks every live WebSocket connection together with its optional
//! date filter. The sender half and the filter live in one map entry,
//! so a connection can never be registered "halfway"; every snapshot
//! is taken under the lock and is therefore atomic with respect to
//! concurrent register/unregister calls.

use std::collections::HashMap;

use axum::extract::ws::Message;
use chrono::NaiveDate;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Registry key for one connection.
pub type ConnId = Uuid;

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Errors from registry mutations.
///
/// `UnknownConnection` is a benign race in normal operation (the peer
/// disconnected between message receipt and processing); callers log
/// it and move on rather than propagating.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("connection {0} is already registered")]
    DuplicateConnection(ConnId),
    #[error("connection {0} is not registered")]
    UnknownConnection(ConnId),
}

/// State held for a single connection.
struct Connection {
    /// Channel sender for outbound messages to this connection.
    sender: WsSender,
    /// Active date filter; `None` means live mode.
    filter_date: Option<NaiveDate>,
}

/// Manages all active WebSocket connections and their filters.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc`
/// and shared between the broadcast engine and the per-connection
/// handlers.
pub struct WsRegistry {
    connections: RwLock<HashMap<ConnId, Connection>>,
}

impl WsRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection in live mode (no filter).
    ///
    /// Returns the receiver half of the message channel so the caller
    /// can forward messages to the WebSocket sink.
    pub async fn register(
        &self,
        conn_id: ConnId,
    ) -> Result<mpsc::UnboundedReceiver<Message>, RegistryError> {
        let mut conns = self.connections.write().await;
        if conns.contains_key(&conn_id) {
            return Err(RegistryError::DuplicateConnection(conn_id));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        conns.insert(
            conn_id,
            Connection {
                sender: tx,
                filter_date: None,
            },
        );
        Ok(rx)
    }

    /// Remove a connection and its filter entry.
    ///
    /// Idempotent: removing an absent connection is a no-op, which
    /// covers the race where a send failure and a protocol-level
    /// disconnect both trigger removal.
    pub async fn unregister(&self, conn_id: ConnId) {
        self.connections.write().await.remove(&conn_id);
    }

    /// Update the filter entry for an existing connection.
    pub async fn set_filter(
        &self,
        conn_id: ConnId,
        filter_date: Option<NaiveDate>,
    ) -> Result<(), RegistryError> {
        let mut conns = self.connections.write().await;
        match conns.get_mut(&conn_id) {
            Some(conn) => {
                conn.filter_date = filter_date;
                Ok(())
            }
            None => Err(RegistryError::UnknownConnection(conn_id)),
        }
    }

    /// Outbound sender for a connection, if it is still registered.
    pub async fn sender_of(&self, conn_id: ConnId) -> Option<WsSender> {
        self.connections
            .read()
            .await
            .get(&conn_id)
            .map(|c| c.sender.clone())
    }

    /// Current filter of a connection, if it is registered.
    pub async fn filter_of(&self, conn_id: ConnId) -> Option<Option<NaiveDate>> {
        self.connections
            .read()
            .await
            .get(&conn_id)
            .map(|c| c.filter_date)
    }

    /// Atomic snapshot of connections currently in live mode.
    pub async fn live_connections(&self) -> Vec<(ConnId, WsSender)> {
        self.connections
            .read()
            .await
            .iter()
            .filter(|(_, conn)| conn.filter_date.is_none())
            .map(|(id, conn)| (*id, conn.sender.clone()))
            .collect()
    }

    /// Atomic snapshot of every registered connection, used for
    /// keepalive delivery regardless of filter state.
    pub async fn all_connections(&self) -> Vec<(ConnId, WsSender)> {
        self.connections
            .read()
            .await
            .iter()
            .map(|(id, conn)| (*id, conn.sender.clone()))
            .collect()
    }

    /// Return the current number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }
}

impl Default for WsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
