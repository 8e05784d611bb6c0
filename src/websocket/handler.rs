//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and manages the session lifecycle:
//! a session and its render loop live exactly as long as the connection.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::hub::ConnectionHub;
use super::messages::{ClientMessage, ServerMessage};
use crate::api::AppState;
use crate::render::{RenderOutput, SessionDriver, SessionEvent};
use crate::session::Session;

/// WebSocket upgrade handler
///
/// This is the entry point for dashboard sessions.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let hub = Arc::clone(&state.ws_hub);

    // Create channel for sending messages to this connection
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let session_id = match hub.register(tx).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "Failed to register dashboard session");
            if let Ok(text) = serde_json::to_string(&ServerMessage::protocol_error(e.to_string())) {
                let _ = sender.send(Message::Text(text)).await;
            }
            return;
        }
    };

    let connected = ServerMessage::Connected {
        session_id: session_id.clone(),
        refresh_interval_secs: state.dashboard.refresh_interval_secs,
    };
    if hub.send_to(&session_id, connected).await.is_err() {
        hub.unregister(&session_id).await;
        return;
    }

    // Task to forward messages from channel to WebSocket
    let conn_id_for_send = session_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if sender.send(Message::Text(text)).await.is_err() {
                        tracing::debug!(
                            session_id = %conn_id_for_send,
                            "WebSocket send failed, closing connection"
                        );
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize message");
                }
            }
        }
    });

    // Render loop for this session
    let (events_tx, events_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderOutput>();
    let driver = SessionDriver::new(
        Arc::clone(&state.renderer),
        Session::with_id(session_id.clone()),
        state.dashboard.refresh_interval(),
    );
    let driver_task = tokio::spawn(driver.run(events_rx, render_tx));

    // Task to deliver render output to the connection
    let hub_for_render = Arc::clone(&hub);
    let conn_id_for_render = session_id.clone();
    let render_task = tokio::spawn(async move {
        while let Some(output) = render_rx.recv().await {
            if hub_for_render
                .send_to(&conn_id_for_render, output.into())
                .await
                .is_err()
            {
                break;
            }
        }
    });

    // Task to receive messages from WebSocket and handle them
    let hub_for_recv = Arc::clone(&hub);
    let conn_id_for_recv = session_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_ws_message(&hub_for_recv, &conn_id_for_recv, &events_tx, msg).await
                    {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        session_id = %conn_id_for_recv,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
            }
        }
    });

    // Wait for either side of the connection to finish
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    // The session ends with the connection
    driver_task.abort();
    render_task.abort();
    hub.unregister(&session_id).await;
}

/// Handle a received WebSocket message
///
/// Returns false if the connection should be closed.
async fn handle_ws_message(
    hub: &Arc<ConnectionHub>,
    session_id: &str,
    events: &mpsc::UnboundedSender<SessionEvent>,
    message: Message,
) -> bool {
    match message {
        Message::Text(text) => {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    if let Some(event) = client_msg.as_event() {
                        tracing::debug!(session_id = %session_id, event = ?event, "Session event");
                        if events.send(event).is_err() {
                            return false;
                        }
                    } else {
                        let _ = hub.send_to(session_id, ServerMessage::Pong).await;
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        session_id = %session_id,
                        error = %e,
                        text = %text,
                        "Invalid client message"
                    );
                    // Send error but keep connection open
                    let error_msg =
                        ServerMessage::protocol_error(format!("Invalid message format: {}", e));
                    let _ = hub.send_to(session_id, error_msg).await;
                }
            }
            true
        }
        Message::Binary(_) => {
            let error_msg = ServerMessage::protocol_error("Binary messages not supported");
            let _ = hub.send_to(session_id, error_msg).await;
            true
        }
        // Axum answers pings itself
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(session_id = %session_id, "Client requested close");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::HubConfig;

    async fn setup() -> (
        Arc<ConnectionHub>,
        String,
        mpsc::UnboundedReceiver<ServerMessage>,
        mpsc::UnboundedSender<SessionEvent>,
        mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        let hub = Arc::new(ConnectionHub::new(HubConfig::default()));
        let (tx, rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (hub, id, rx, events_tx, events_rx)
    }

    #[tokio::test]
    async fn test_toggle_message_becomes_event() {
        let (hub, id, _out, events_tx, mut events_rx) = setup().await;

        let keep_open = handle_ws_message(
            &hub,
            &id,
            &events_tx,
            Message::Text(r#"{"type":"toggle_auto_refresh"}"#.to_string()),
        )
        .await;

        assert!(keep_open);
        assert_eq!(events_rx.try_recv().unwrap(), SessionEvent::ToggleAutoRefresh);
    }

    #[tokio::test]
    async fn test_ping_answers_pong() {
        let (hub, id, mut out, events_tx, mut events_rx) = setup().await;

        handle_ws_message(&hub, &id, &events_tx, Message::Text(r#"{"type":"ping"}"#.to_string()))
            .await;

        assert!(matches!(out.try_recv(), Ok(ServerMessage::Pong)));
        assert!(events_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_invalid_message_keeps_connection() {
        let (hub, id, mut out, events_tx, _events_rx) = setup().await;

        let keep_open =
            handle_ws_message(&hub, &id, &events_tx, Message::Text("not json".to_string())).await;

        assert!(keep_open);
        assert!(matches!(
            out.try_recv(),
            Ok(ServerMessage::Error { ref kind, .. }) if kind == "protocol"
        ));
    }

    #[tokio::test]
    async fn test_close_ends_connection() {
        let (hub, id, _out, events_tx, _events_rx) = setup().await;
        assert!(!handle_ws_message(&hub, &id, &events_tx, Message::Close(None)).await);
    }

    #[tokio::test]
    async fn test_event_after_driver_exit_ends_connection() {
        let (hub, id, _out, events_tx, events_rx) = setup().await;
        drop(events_rx);

        let keep_open = handle_ws_message(
            &hub,
            &id,
            &events_tx,
            Message::Text(r#"{"type":"rerun"}"#.to_string()),
        )
        .await;
        assert!(!keep_open);
    }
}
