//! WebSocket handler for live log delivery.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use logvault::Subscription;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::error::ServerError;
use crate::state::AppState;
use crate::types::LiveMessage;

/// Holds one slot of the connection limit until dropped.
struct ConnectionSlot(Arc<AppState>);

impl ConnectionSlot {
    fn acquire(state: &Arc<AppState>) -> Option<Self> {
        state.add_ws_connection().then(|| Self(Arc::clone(state)))
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.0.remove_ws_connection();
    }
}

/// Handle WebSocket upgrade request for /api/ws.
pub async fn ws_upgrade(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> Result<Response, ServerError> {
    let Some(slot) = ConnectionSlot::acquire(&state) else {
        let current = state.ws_connection_count();
        let max = state.config().max_ws_connections;
        warn!(current, max, "rejecting WebSocket connection");
        return Err(ServerError::TooManyConnections(current, max));
    };

    Ok(ws.on_upgrade(move |socket| handle_ws_connection(socket, slot)))
}

/// Handle an active WebSocket connection.
async fn handle_ws_connection(socket: WebSocket, slot: ConnectionSlot) {
    let state = Arc::clone(&slot.0);
    let (mut sender, mut receiver) = socket.split();

    let subscription = state.service().subscribe();
    let subscriber = subscription.id();
    let ping_interval = state.config().ws_ping_interval;
    info!(%subscriber, "WebSocket client connected");

    let mut send_task = tokio::spawn(async move {
        forward_entries_to_ws(&mut sender, subscription, ping_interval).await;
    });
    let mut recv_task = tokio::spawn(async move {
        handle_incoming_messages(&mut receiver).await;
    });

    tokio::select! {
        _ = &mut send_task => {
            debug!("WebSocket send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            debug!("WebSocket receive task completed");
            send_task.abort();
        }
    }

    drop(slot);
    info!(%subscriber, "WebSocket connection closed");
}

async fn send_frame(
    sender: &mut SplitSink<WebSocket, Message>,
    frame: &LiveMessage,
) -> Result<(), axum::Error> {
    match serde_json::to_string(frame) {
        Ok(json) => sender.send(Message::Text(json.into())).await,
        Err(e) => {
            warn!(error = %e, kind = frame.event_type(), "failed to serialize frame");
            Ok(())
        }
    }
}

/// Forward accepted entries to the WebSocket, interleaved with heartbeats.
async fn forward_entries_to_ws(
    sender: &mut SplitSink<WebSocket, Message>,
    mut subscription: Subscription,
    ping_interval: Duration,
) {
    let mut ping_timer = interval(ping_interval);
    ping_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ping_timer.tick().await;

    loop {
        let frame = tokio::select! {
            next = subscription.recv() => match next {
                Some(entry) => LiveMessage::Log { entry },
                None => break,
            },
            _ = ping_timer.tick() => LiveMessage::heartbeat(),
        };

        if send_frame(sender, &frame).await.is_err() {
            break;
        }
    }
}

/// Drain client frames until the client closes or errors.
async fn handle_incoming_messages(receiver: &mut SplitStream<WebSocket>) {
    while let Some(msg_result) = receiver.next().await {
        match msg_result {
            Ok(Message::Close(_)) => {
                debug!("Received close frame");
                break;
            }
            Ok(Message::Text(text)) => {
                debug!(message = %text, "ignoring client text frame");
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "WebSocket receive error");
                break;
            }
        }
    }
}
