//! WebSocket API for the Ludo server.
//!
//! The entire protocol runs over a single websocket endpoint:
//!
//! - `GET /ws` - Establish the game connection
//!
//! Every inbound frame is a tagged JSON [`ClientMessage`](ludo::ClientMessage)
//! and every outbound frame a tagged JSON [`ServerEvent`](ludo::ServerEvent).
//! There is no HTTP surface beyond the upgrade: rooms are created, joined,
//! and played entirely over the socket.
//!
//! # Modules
//!
//! - [`websocket`]: connection upgrade, frame loop, and disconnect handling
//! - [`handlers`]: per-message dispatch against the room registry
//! - [`connections`]: live socket tracking, per-IP ceilings, liveness clocks
//! - [`rate_limiter`]: sliding-window message budget per client IP
//!
//! # Abuse controls
//!
//! - Connections per IP are capped before the upgrade completes
//! - Messages per IP are rate limited with a sliding window
//! - Oversized frames are rejected without parsing

pub mod connections;
pub mod handlers;
pub mod rate_limiter;
pub mod websocket;

use std::sync::Arc;

use axum::{Router, routing::get};
use ludo::{RoomRegistry, scheduler::Dice};
use tokio::sync::Mutex;

use crate::config::ServerConfig;
use connections::ConnectionManager;

/// Application state shared across all WebSocket connections.
///
/// Cloned per connection (cheap due to Arc wrappers).
#[derive(Clone)]
pub struct AppState {
    /// All live rooms, players, and reconnection tokens
    pub registry: Arc<RoomRegistry>,
    /// Live sockets, per-IP ceilings, and liveness clocks
    pub connections: Arc<ConnectionManager>,
    /// The single dice source shared by every room
    pub dice: Arc<Mutex<Dice>>,
    /// Validated server configuration
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            registry: Arc::new(RoomRegistry::new(config.max_rooms)),
            connections: Arc::new(ConnectionManager::new(&config)),
            dice: Arc::new(Mutex::new(Dice::new())),
            config: Arc::new(config),
        }
    }
}

/// Create the application router with the websocket endpoint.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(websocket::websocket_handler))
        .with_state(state)
}
