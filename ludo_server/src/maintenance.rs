//! Background maintenance loops.
//!
//! Two periodic tasks keep the server healthy without any external trigger:
//! a sweep that evicts silent players and deletes abandoned rooms, and a
//! heartbeat that pings every live socket so idle connections produce pongs.

use log::info;
use tokio::task::JoinHandle;

use crate::api::{AppState, handlers};

/// Spawns the maintenance loops. The handles live as long as the server.
pub fn spawn(state: AppState) -> Vec<JoinHandle<()>> {
    vec![
        tokio::spawn(cleanup_loop(state.clone())),
        tokio::spawn(heartbeat_loop(state)),
    ]
}

/// Evicts players who stopped talking and deletes rooms nobody uses.
async fn cleanup_loop(state: AppState) {
    let mut ticker = tokio::time::interval(state.config.sweep_interval);
    loop {
        ticker.tick().await;

        // Players past the disconnect timeout with no live transport lose
        // their seat; reconnection tokens die with it.
        for player_id in state
            .connections
            .idle_players(state.config.disconnect_timeout)
            .await
        {
            if state.connections.is_connected(player_id).await {
                continue;
            }
            info!("evicting idle player {player_id}");
            handlers::evict_player(&state, player_id).await;
            state.connections.forget(player_id).await;
        }

        // Rooms with no connected member and no recent activity are deleted.
        for (code, handle) in state.registry.rooms_snapshot().await {
            let mut room = handle.lock().await;
            let idle_for = room.last_activity.elapsed();
            if idle_for <= state.config.empty_room_timeout {
                continue;
            }
            let mut anyone_connected = false;
            for player in &room.players {
                if state.connections.is_connected(player.id).await {
                    anyone_connected = true;
                    break;
                }
            }
            if !anyone_connected {
                info!("deleting stale room {code} (idle {}s)", idle_for.as_secs());
                state.registry.delete_room(&mut room).await;
            }
        }
    }
}

/// Pings every connected client so liveness clocks keep moving.
async fn heartbeat_loop(state: AppState) {
    let mut ticker = tokio::time::interval(state.config.ping_interval);
    loop {
        ticker.tick().await;
        state.connections.ping_all().await;
    }
}
