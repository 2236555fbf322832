//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::net::SocketAddr;
use std::time::Duration;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Maximum accepted websocket message size in bytes
    pub max_ws_message_size: usize,
    /// Maximum simultaneous websocket connections per client IP
    pub max_connections_per_ip: usize,
    /// Maximum messages per client IP within the rate-limit window
    pub rate_limit_messages: usize,
    /// Rate-limit window duration
    pub rate_limit_window: Duration,
    /// Interval between server-initiated pings
    pub ping_interval: Duration,
    /// How long a silent player survives before being evicted
    pub disconnect_timeout: Duration,
    /// Interval between maintenance sweeps
    pub sweep_interval: Duration,
    /// Maximum number of simultaneously open rooms
    pub max_rooms: usize,
    /// How long an empty room survives before deletion
    pub empty_room_timeout: Duration,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if the bind address is present but unparseable
    pub fn from_env(bind_override: Option<SocketAddr>) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => match std::env::var("SERVER_BIND") {
                Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                    var: "SERVER_BIND".to_string(),
                    reason: format!("Not a valid socket address: {raw}"),
                })?,
                Err(_) => SocketAddr::from(([127, 0, 0, 1], 6969)),
            },
        };

        Ok(ServerConfig {
            bind,
            max_ws_message_size: parse_env_or("MAX_WS_MESSAGE_SIZE", 4096),
            max_connections_per_ip: parse_env_or("MAX_CONNECTIONS_PER_IP", 10),
            rate_limit_messages: parse_env_or("RATE_LIMIT_MESSAGES", 30),
            rate_limit_window: Duration::from_secs(parse_env_or("RATE_LIMIT_WINDOW_SECS", 10)),
            ping_interval: Duration::from_secs(parse_env_or("WS_PING_INTERVAL_SECS", 30)),
            disconnect_timeout: Duration::from_secs(parse_env_or(
                "PLAYER_DISCONNECT_TIMEOUT_SECS",
                120,
            )),
            sweep_interval: Duration::from_secs(parse_env_or("CLEANUP_CHECK_INTERVAL_SECS", 15)),
            max_rooms: parse_env_or("MAX_ROOMS", 50),
            empty_room_timeout: Duration::from_secs(parse_env_or("EMPTY_ROOM_TIMEOUT_SECS", 300)),
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_ws_message_size == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_WS_MESSAGE_SIZE".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.max_connections_per_ip == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_CONNECTIONS_PER_IP".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.rate_limit_messages == 0 {
            return Err(ConfigError::Invalid {
                var: "RATE_LIMIT_MESSAGES".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.rate_limit_window.is_zero() {
            return Err(ConfigError::Invalid {
                var: "RATE_LIMIT_WINDOW_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.max_rooms == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_ROOMS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.disconnect_timeout <= self.sweep_interval {
            return Err(ConfigError::Invalid {
                var: "PLAYER_DISCONNECT_TIMEOUT_SECS".to_string(),
                reason: format!(
                    "Must be greater than the sweep interval ({}s)",
                    self.sweep_interval.as_secs()
                ),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
