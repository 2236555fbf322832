//! WebSocket handler for the game protocol.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws`
//! 2. Server checks the per-IP connection ceiling before upgrading
//! 3. Server spawns a send task draining this connection's outbound channel
//! 4. Incoming frames are size-checked, rate-limited, parsed, and dispatched
//! 5. On disconnect the seat survives for reconnection; the liveness sweep
//!    evicts it later if the player never returns
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:6969/ws');
//!
//! ws.send(JSON.stringify({ type: "create_room", name: "alice" }));
//! ws.onmessage = (event) => {
//!   const data = JSON.parse(event.data);
//!   if (data.type === "joined") saveToken(data.token);
//! };
//! ```

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{
        ConnectInfo, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use log::{info, warn};
use ludo::{ClientMessage, ServerEvent};

use super::handlers::{self, Session, reply};
use super::AppState;

/// Upgrade an HTTP connection to the game WebSocket.
///
/// Rejects the upgrade with `429 Too Many Requests` when the client IP is
/// already at its connection ceiling.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    let ip = client_ip(&headers, addr);
    if !state.connections.try_register_ip(ip).await {
        return (StatusCode::TOO_MANY_REQUESTS, "Too many connections").into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, ip, state))
}

/// Client IP for abuse controls: the first `x-forwarded-for` hop when the
/// server sits behind a proxy, the peer address otherwise.
fn client_ip(headers: &HeaderMap, addr: SocketAddr) -> IpAddr {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .unwrap_or_else(|| addr.ip())
}

/// Handle an established WebSocket connection until it closes.
async fn handle_socket(socket: WebSocket, ip: IpAddr, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    info!("WebSocket connected from {ip}");

    // All outbound traffic for this socket funnels through one channel so
    // broadcasts never block on a slow peer while a room lock is held.
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    let send_task = tokio::spawn(async move {
        while let Some(json) = rx.recv().await {
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut session = Session::default();

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if text.len() > state.config.max_ws_message_size {
                    warn!("oversized message ({} bytes) from {ip}", text.len());
                    reply(&tx, &ServerEvent::error("Message too large"));
                    continue;
                }

                if !state.connections.check_rate(ip).await {
                    warn!("rate limit exceeded for {ip}");
                    reply(&tx, &ServerEvent::error("Rate limit exceeded. Please slow down."));
                    continue;
                }

                let msg = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!("unparseable message from {ip}: {e}");
                        reply(&tx, &ServerEvent::error("Invalid message format"));
                        continue;
                    }
                };

                if let Err(err) = handlers::dispatch(&state, &mut session, &tx, msg).await {
                    warn!("request from {ip} rejected ({:?}): {err}", err.category());
                    reply(&tx, &ServerEvent::error(err.to_string()));
                }
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket closed by {ip}");
                break;
            }
            Err(e) => {
                warn!("WebSocket error from {ip}: {e}");
                break;
            }
            _ => {}
        }
    }

    // The seat is kept for reconnection; only the transport goes away.
    send_task.abort();
    state.connections.release_ip(ip).await;
    if let Some(player_id) = session.player_id {
        state.connections.unbind(player_id).await;
        handlers::report_connection_lost(&state, player_id).await;
    }

    info!("WebSocket disconnected: {ip}");
}
