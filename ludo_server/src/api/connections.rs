//! Live websocket connection tracking.
//!
//! Maps players to their outbound message channels, counts open connections
//! per client IP, keeps per-IP rate limiters, and records last-seen times
//! for the liveness sweep.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use log::{error, warn};
use ludo::{PlayerId, ServerEvent};
use tokio::sync::{Mutex, RwLock, mpsc};

use super::rate_limiter::RateLimiter;
use crate::config::ServerConfig;

/// Outbound channel feeding one socket's send task.
pub type ClientSender = mpsc::UnboundedSender<String>;

pub struct ConnectionManager {
    max_connections_per_ip: usize,
    rate_limit_messages: usize,
    rate_limit_window: Duration,
    /// player id -> live outbound channel
    clients: RwLock<HashMap<PlayerId, ClientSender>>,
    /// player id -> last inbound message time
    last_activity: RwLock<HashMap<PlayerId, Instant>>,
    /// open sockets per client IP
    ip_connections: Mutex<HashMap<IpAddr, usize>>,
    rate_limits: Mutex<HashMap<IpAddr, RateLimiter>>,
}

impl ConnectionManager {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            max_connections_per_ip: config.max_connections_per_ip,
            rate_limit_messages: config.rate_limit_messages,
            rate_limit_window: config.rate_limit_window,
            clients: RwLock::new(HashMap::new()),
            last_activity: RwLock::new(HashMap::new()),
            ip_connections: Mutex::new(HashMap::new()),
            rate_limits: Mutex::new(HashMap::new()),
        }
    }

    /// Counts a new socket against its IP's ceiling. Returns `false` when
    /// the IP already has the maximum number of open connections.
    pub async fn try_register_ip(&self, ip: IpAddr) -> bool {
        let mut ips = self.ip_connections.lock().await;
        let count = ips.entry(ip).or_insert(0);
        if *count >= self.max_connections_per_ip {
            warn!("connection ceiling reached for {ip}");
            return false;
        }
        *count += 1;
        true
    }

    /// Releases one socket slot for the IP.
    pub async fn release_ip(&self, ip: IpAddr) {
        let mut ips = self.ip_connections.lock().await;
        if let Some(count) = ips.get_mut(&ip) {
            *count -= 1;
            if *count == 0 {
                ips.remove(&ip);
            }
        }
    }

    /// Checks the IP's sliding-window message budget.
    pub async fn check_rate(&self, ip: IpAddr) -> bool {
        let mut limits = self.rate_limits.lock().await;
        limits
            .entry(ip)
            .or_insert_with(|| RateLimiter::new(self.rate_limit_messages, self.rate_limit_window))
            .check()
    }

    /// Attaches a player's outbound channel, superseding any previous socket
    /// for the same player (the stale send task ends when its channel drops).
    pub async fn bind(&self, player_id: PlayerId, sender: ClientSender) {
        self.clients.write().await.insert(player_id, sender);
        self.touch(player_id).await;
    }

    /// Detaches a player's socket without touching their liveness clock, so
    /// a dropped connection can still reconnect until the sweep fires.
    pub async fn unbind(&self, player_id: PlayerId) {
        self.clients.write().await.remove(&player_id);
    }

    pub async fn is_connected(&self, player_id: PlayerId) -> bool {
        self.clients.read().await.contains_key(&player_id)
    }

    /// Marks the player as alive.
    pub async fn touch(&self, player_id: PlayerId) {
        self.last_activity
            .write()
            .await
            .insert(player_id, Instant::now());
    }

    /// Drops all trace of a player who left for good.
    pub async fn forget(&self, player_id: PlayerId) {
        self.clients.write().await.remove(&player_id);
        self.last_activity.write().await.remove(&player_id);
    }

    /// Players whose last inbound message is older than `timeout`.
    pub async fn idle_players(&self, timeout: Duration) -> Vec<PlayerId> {
        let now = Instant::now();
        self.last_activity
            .read()
            .await
            .iter()
            .filter(|(_, seen)| now.duration_since(**seen) > timeout)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Sends one event to one player. A closed channel unbinds the player;
    /// their seat and liveness clock are left for the sweep to judge.
    pub async fn send(&self, player_id: PlayerId, event: &ServerEvent) {
        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                error!("failed to serialize server event: {e}");
                return;
            }
        };
        let sender = self.clients.read().await.get(&player_id).cloned();
        if let Some(sender) = sender
            && sender.send(json).is_err()
        {
            self.unbind(player_id).await;
        }
    }

    /// Sends one event to every listed player.
    pub async fn broadcast(&self, player_ids: &[PlayerId], event: &ServerEvent) {
        for player_id in player_ids {
            self.send(*player_id, event).await;
        }
    }

    /// Pings every connected player.
    pub async fn ping_all(&self) {
        let targets: Vec<PlayerId> = self.clients.read().await.keys().copied().collect();
        for player_id in targets {
            self.send(player_id, &ServerEvent::Ping).await;
        }
    }
}
