//! Real-time multiplayer Ludo server.
//!
//! Hosts many simultaneous [`ludo`] matches behind a single websocket
//! endpoint, with per-IP abuse controls and background maintenance sweeps.

pub mod api;
pub mod config;
pub mod maintenance;
