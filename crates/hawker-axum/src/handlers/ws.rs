//! WebSocket upgrade handler.
//!
//! `GET /api/v1/ws` upgrades the connection and registers it with the
//! hub. Two tasks are spawned per connection:
//!
//! * **Write pump** — drains the hub-assigned outbound queue into text
//!   frames. The queue closing (hub dropped the client as a slow
//!   consumer) ends the pump and thereby the connection.
//! * **Read pump** — drains inbound frames purely to detect the close
//!   handshake or a dead socket; clients never send payloads the
//!   server interprets.
//!
//! Whichever pump finishes first aborts the other, then the client is
//! unregistered so the hub never fans out to a dead queue.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tracing::debug;

use crate::state::AppState;

/// `GET /api/v1/ws` — upgrade and register with the hub.
pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let client = state.hub.register();
    let client_id = client.id;
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let mut write = tokio::spawn(async move {
        let mut outbound = client.outbound;
        while let Some(payload) = outbound.recv().await {
            if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                // Peer gone; the read pump observes the same close.
                break;
            }
        }
        // Queue closed (slow-consumer drop or hub shutdown): say goodbye.
        let _ = ws_sender.send(Message::Close(None)).await;
    });

    let mut read = tokio::spawn(async move {
        while let Some(message) = ws_receiver.next().await {
            match message {
                Ok(Message::Close(_)) | Err(_) => break,
                // Ping/pong are answered by the protocol layer; any
                // other inbound frame only proves liveness.
                Ok(_) => {}
            }
        }
    });

    tokio::select! {
        _ = &mut write => read.abort(),
        _ = &mut read => write.abort(),
    }

    state.hub.unregister(client_id);
    debug!(client = client_id, "socket handler finished");
}
