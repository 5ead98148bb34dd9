//! Per-connection WebSocket lifecycle and inbound message handling.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use remanet_core::maintenance::MaintenanceThresholds;
use remanet_core::protocol::{self, Heartbeat};
use remanet_core::thresholds::AlertThresholds;
use remanet_db::TelemetrySource;

use crate::state::AppState;
use crate::ws::broadcast::push_snapshot;
use crate::ws::registry::{ConnId, WsRegistry};

/// HTTP handler that upgrades the connection to WebSocket.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection and ensures the broadcast engine is
///      running (idempotent start).
///   2. Spawns a sender task that forwards messages from the registry
///      channel to the sink, isolating slow sends from other
///      connections.
///   3. Pushes an initial unfiltered payload triple.
///   4. Processes inbound messages on the current task.
///   5. Cleans up on disconnect.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id: ConnId = uuid::Uuid::new_v4();

    let mut rx = match state.registry.register(conn_id).await {
        Ok(rx) => rx,
        Err(e) => {
            // A v4 collision; nothing sensible to do with this socket.
            tracing::error!(error = %e, "Failed to register connection");
            return;
        }
    };
    let count = state.registry.connection_count().await;
    tracing::info!(%conn_id, count, "Client connected");

    state.broadcaster.start();

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id;
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // Initial push so a new viewer renders immediately instead of
    // waiting up to one broadcast interval.
    if let Some(sender) = state.registry.sender_of(conn_id).await {
        push_snapshot(
            state.source.as_ref(),
            &state.config.alert_thresholds,
            &state.config.maintenance_thresholds,
            None,
            &sender,
        )
        .await;
    }

    // Receiver loop: process inbound messages.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                handle_text(
                    state.registry.as_ref(),
                    state.source.as_ref(),
                    &state.config.alert_thresholds,
                    &state.config.maintenance_thresholds,
                    conn_id,
                    text.as_str(),
                )
                .await
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_) | Message::Pong(_)) => {
                tracing::trace!(%conn_id, "Control frame received");
            }
            Ok(Message::Binary(_)) => {
                tracing::debug!(%conn_id, "Ignoring binary frame");
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Clean up: remove connection and abort sender task.
    state.registry.unregister(conn_id).await;
    send_task.abort();
    let count = state.registry.connection_count().await;
    tracing::info!(%conn_id, count, "Client disconnected");
}

/// Process one inbound text frame.
///
/// A frame may carry a filter update, a keepalive ping, or both, and
/// each part is handled independently. Malformed frames are logged
/// and ignored; they never terminate the connection.
///
/// Takes the collaborators directly rather than [`AppState`] so tests
/// can drive the decode → filter → push chain without a database.
pub async fn handle_text(
    registry: &WsRegistry,
    source: &dyn TelemetrySource,
    alert_thresholds: &AlertThresholds,
    maintenance_thresholds: &MaintenanceThresholds,
    conn_id: ConnId,
    text: &str,
) {
    let msg = match protocol::decode_client_message(text) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::warn!(%conn_id, error = %e, "Ignoring malformed client message");
            return;
        }
    };

    if let Some(filter_date) = msg.filter_update {
        if registry.set_filter(conn_id, filter_date).await.is_err() {
            // UnknownConnection: the peer disconnected between message
            // receipt and processing. Benign race, do not propagate.
            tracing::debug!(%conn_id, "Filter update for connection already gone");
            return;
        }
        tracing::info!(%conn_id, ?filter_date, "Updated connection filter");

        // Immediate one-shot push with the new filter, independent of
        // the periodic tick.
        if let Some(sender) = registry.sender_of(conn_id).await {
            push_snapshot(
                source,
                alert_thresholds,
                maintenance_thresholds,
                filter_date,
                &sender,
            )
            .await;
        }
    }

    if msg.ping {
        if let Some(sender) = registry.sender_of(conn_id).await {
            if let Ok(pong) = serde_json::to_string(&Heartbeat::pong_now()) {
                let _ = sender.send(Message::Text(pong.into()));
            }
        }
    }
}
