//! WebSocket Connection Hub
//!
//! Registry of live dashboard sessions. Each entry owns the outbound
//! channel of one connection and mirrors that session's auto-refresh flag
//! for health reporting. Sessions never share state.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::messages::ServerMessage;
use crate::session::SessionId;

/// Manages all WebSocket connections
pub struct ConnectionHub {
    /// Active connections: SessionId → ConnectionHandle
    connections: Arc<RwLock<HashMap<SessionId, ConnectionHandle>>>,
    /// Configuration
    config: HubConfig,
}

/// Configuration for the connection hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent sessions
    pub max_connections: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
        }
    }
}

/// Handle for sending messages to a specific connection
pub struct ConnectionHandle {
    /// Channel sender for this connection
    pub sender: mpsc::UnboundedSender<ServerMessage>,
    /// Last auto-refresh value rendered for this session
    pub auto_refresh: bool,
}

impl ConnectionHub {
    /// Create a new connection hub
    pub fn new(config: HubConfig) -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Register a new WebSocket connection
    ///
    /// Returns the session ID on success, or an error if the connection
    /// limit has been reached.
    pub async fn register(
        &self,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<SessionId, HubError> {
        let mut connections = self.connections.write().await;
        if connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let id = Uuid::new_v4().to_string();
        connections.insert(
            id.clone(),
            ConnectionHandle {
                sender,
                auto_refresh: false,
            },
        );

        tracing::info!(session_id = %id, "Dashboard session opened");
        Ok(id)
    }

    /// Unregister a connection
    pub async fn unregister(&self, id: &str) {
        if self.connections.write().await.remove(id).is_some() {
            tracing::info!(session_id = %id, "Dashboard session closed");
        }
    }

    /// Send a message directly to a specific connection
    pub async fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections.get_mut(id).ok_or(HubError::ConnectionNotFound)?;

        if let ServerMessage::Dashboard { view } = &message {
            handle.auto_refresh = view.auto_refresh;
        }

        handle
            .sender
            .send(message)
            .map_err(|_| HubError::SendFailed)
    }

    /// Get the current connection count
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Number of sessions whose last rendered view had auto-refresh on
    pub async fn auto_refresh_count(&self) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|h| h.auto_refresh)
            .count()
    }
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many sessions (limit: {0})")]
    TooManyConnections(usize),

    #[error("Session not found")]
    ConnectionNotFound,

    #[error("Failed to send message")]
    SendFailed,
}
