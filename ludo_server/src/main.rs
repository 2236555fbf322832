//! Real-time Ludo game server.
//!
//! Serves the complete game protocol over a single websocket endpoint and
//! runs the maintenance sweeps that keep rooms and connections healthy.

use std::net::SocketAddr;

use anyhow::Error;
use ctrlc::set_handler;
use log::info;
use ludo_server::{api, config::ServerConfig, maintenance};
use pico_args::Arguments;

const HELP: &str = "\
Run a real-time multiplayer Ludo server

USAGE:
  ludo_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND                     Server bind address (e.g., 0.0.0.0:8080)
  MAX_ROOMS                       Maximum simultaneously open rooms [default: 50]
  MAX_CONNECTIONS_PER_IP          Open sockets allowed per client IP [default: 10]
  RATE_LIMIT_MESSAGES             Messages per IP per window [default: 30]
  RATE_LIMIT_WINDOW_SECS          Rate limit window [default: 10]
  MAX_WS_MESSAGE_SIZE             Maximum message size in bytes [default: 4096]
  WS_PING_INTERVAL_SECS           Heartbeat interval [default: 30]
  PLAYER_DISCONNECT_TIMEOUT_SECS  Silence allowed before eviction [default: 120]
  CLEANUP_CHECK_INTERVAL_SECS     Maintenance sweep interval [default: 15]
  EMPTY_ROOM_TIMEOUT_SECS         Idle time before room deletion [default: 300]
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind_override: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();

    let config = ServerConfig::from_env(bind_override)?;
    config.validate()?;

    info!("Starting Ludo server at {}", config.bind);
    info!(
        "Limits: {} rooms, {} connections/IP, {} msgs/{}s",
        config.max_rooms,
        config.max_connections_per_ip,
        config.rate_limit_messages,
        config.rate_limit_window.as_secs()
    );

    let bind = config.bind;
    let state = api::AppState::new(config);
    let _maintenance = maintenance::spawn(state.clone());

    let app = api::create_router(state);
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", bind, e))?;

    info!("Server is running at ws://{}/ws. Press Ctrl+C to stop.", bind);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        log::error!("Failed to install CTRL+C signal handler");
    }
}
