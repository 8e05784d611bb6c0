//! WebSocket Message Types
//!
//! Defines all message types exchanged between a dashboard page and the
//! Blockwatch server.

use serde::{Deserialize, Serialize};

use crate::render::{DashboardView, RenderOutput, SessionEvent};

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// The auto-refresh toggle button was pressed
    ToggleAutoRefresh,
    /// Render the dashboard again
    Rerun,
    /// Ping for keepalive
    Ping,
}

impl ClientMessage {
    /// The session event this message triggers, if any
    pub fn as_event(&self) -> Option<SessionEvent> {
        match self {
            ClientMessage::ToggleAutoRefresh => Some(SessionEvent::ToggleAutoRefresh),
            ClientMessage::Rerun => Some(SessionEvent::Rerun),
            ClientMessage::Ping => None,
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Session established
    Connected {
        /// Unique session identifier
        session_id: String,
        /// Seconds between refreshes while auto-refresh is on
        refresh_interval_secs: u64,
    },
    /// A freshly rendered dashboard
    Dashboard { view: DashboardView },
    /// A render cycle or protocol error
    Error {
        /// "remote_query", "result_shape" or "protocol"
        kind: String,
        message: String,
    },
    /// Pong response to ping
    Pong,
}

impl ServerMessage {
    pub fn protocol_error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            kind: "protocol".to_string(),
            message: message.into(),
        }
    }
}

impl From<RenderOutput> for ServerMessage {
    fn from(output: RenderOutput) -> Self {
        match output {
            RenderOutput::View(view) => ServerMessage::Dashboard { view },
            RenderOutput::Failed { kind, message } => ServerMessage::Error { kind, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_deserialize_toggle() {
        let json = r#"{"type": "toggle_auto_refresh"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::ToggleAutoRefresh));
        assert_eq!(msg.as_event(), Some(SessionEvent::ToggleAutoRefresh));
    }

    #[test]
    fn test_client_message_deserialize_ping() {
        let json = r#"{"type": "ping"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
        assert_eq!(msg.as_event(), None);
    }

    #[test]
    fn test_client_message_unknown_type() {
        let json = r#"{"type": "subscribe", "topics": []}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn test_server_message_serialize_connected() {
        let msg = ServerMessage::Connected {
            session_id: "abc-123".to_string(),
            refresh_interval_secs: 10,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"connected\""));
        assert!(json.contains("\"session_id\":\"abc-123\""));
    }

    #[test]
    fn test_failed_output_becomes_error() {
        let msg = ServerMessage::from(RenderOutput::Failed {
            kind: "remote_query".to_string(),
            message: "Unauthorized".to_string(),
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"error\""));
        assert!(json.contains("\"kind\":\"remote_query\""));
    }
}
