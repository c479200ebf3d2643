//! Realtime score channel
//!
//! Serves the live score feed over WebSocket on its own port. Each
//! connection is admitted to the hub and owned by its own forwarding
//! task, so broadcast fan-out stays fire-and-forget per subscriber: a
//! slow or dead socket only ever stalls itself.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::hub::Hub;

/// How long one subscriber's socket send may stall before eviction.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the realtime router: a single WebSocket upgrade route at `/`.
pub fn build_router(hub: Arc<Hub>) -> Router {
    Router::new().route("/", get(ws_handler)).with_state(hub)
}

async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<Arc<Hub>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

/// Own one subscriber connection for its lifetime.
///
/// Nothing is sent on connect; the client sees only scores published
/// after admission. Disconnect handling is one-way: an evicted client
/// simply stops receiving updates and reconnects as a brand-new
/// subscriber if it wants back in.
async fn handle_socket(socket: WebSocket, hub: Arc<Hub>) {
    let (mut sender, mut receiver) = socket.split();
    let (id, mut rx) = hub.admit();

    info!("Realtime client connected as subscriber {}", id);

    // Forward published messages into the socket.
    let send_hub = Arc::clone(&hub);
    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            match timeout(SEND_TIMEOUT, sender.send(Message::Text(message))).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    debug!("Subscriber {} send failed: {}", id, e);
                    break;
                }
                Err(_) => {
                    warn!("Subscriber {} send timed out, evicting", id);
                    break;
                }
            }
        }
        send_hub.remove(id);
    });

    // Observe the client side; a close or error ends the subscription.
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Close(_)) => {
                info!("Subscriber {} closed connection", id);
                break;
            }
            Err(e) => {
                debug!("Subscriber {} socket error: {}", id, e);
                break;
            }
            // axum answers ping/pong itself; inbound text is ignored.
            _ => {}
        }
    }

    hub.remove(id);
    send_task.abort();
    info!("Realtime client {} disconnected", id);
}
