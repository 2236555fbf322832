//! Room registry: join-code generation, membership, and reconnection tokens.
//!
//! The registry owns every live room. Each room sits behind its own mutex,
//! locked for the duration of handling one message; rooms never need
//! cross-locking because matches are fully independent.

use std::{collections::HashMap, sync::Arc};

use log::info;
use rand::Rng;
use tokio::sync::{Mutex, RwLock};

use crate::game::constants::{MAX_NAME_LEN, ROOM_CODE_ALPHABET, ROOM_CODE_LEN};
use crate::game::entities::{Color, GameRoom, GameStatus, Player, PlayerId};
use crate::game::errors::GameError;

/// Shared handle to one room's exclusive state.
pub type RoomHandle = Arc<Mutex<GameRoom>>;

/// Everything a freshly seated player needs to know.
#[derive(Clone, Debug)]
pub struct JoinedRoom {
    pub room: RoomHandle,
    pub room_code: String,
    pub player_id: PlayerId,
    pub token: String,
    pub solo_mode: bool,
}

/// Process-wide registry of rooms, players, and reconnection tokens.
pub struct RoomRegistry {
    max_rooms: usize,
    rooms: RwLock<HashMap<String, RoomHandle>>,
    /// token -> player id
    tokens: RwLock<HashMap<String, PlayerId>>,
    /// player id -> room code
    player_rooms: RwLock<HashMap<PlayerId, String>>,
}

impl RoomRegistry {
    pub fn new(max_rooms: usize) -> Self {
        Self {
            max_rooms,
            rooms: RwLock::new(HashMap::new()),
            tokens: RwLock::new(HashMap::new()),
            player_rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a room with a collision-checked code and seats its creator
    /// on the first color.
    pub async fn create_room(&self, name: &str, solo_mode: bool) -> Result<JoinedRoom, GameError> {
        let name = validate_name(name)?;

        let mut rooms = self.rooms.write().await;
        if rooms.len() >= self.max_rooms {
            return Err(GameError::TooManyRooms);
        }
        let code = loop {
            let candidate = random_code();
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let mut room = GameRoom::new(code.clone(), solo_mode);
        let mut player = Player::new(name);
        player.color = Some(Color::ALL[0]);
        let player_id = player.id;
        let token = player.token.clone();
        if solo_mode {
            room.solo_player_id = Some(player_id);
        }
        room.players.push(player);

        let handle: RoomHandle = Arc::new(Mutex::new(room));
        rooms.insert(code.clone(), handle.clone());
        drop(rooms);

        self.tokens.write().await.insert(token.clone(), player_id);
        self.player_rooms.write().await.insert(player_id, code.clone());

        info!("room {code} created (solo={solo_mode})");
        Ok(JoinedRoom {
            room: handle,
            room_code: code,
            player_id,
            token,
            solo_mode,
        })
    }

    /// Seats a new player in an existing waiting room.
    pub async fn join_room(&self, name: &str, room_code: &str) -> Result<JoinedRoom, GameError> {
        let name = validate_name(name)?;
        let code = room_code.trim().to_ascii_uppercase();
        if code.len() != ROOM_CODE_LEN {
            return Err(GameError::InvalidRoomCode);
        }

        let handle = {
            let rooms = self.rooms.read().await;
            rooms.get(&code).cloned().ok_or(GameError::RoomNotFound)?
        };

        let (player_id, token) = {
            let mut room = handle.lock().await;
            if room.status != GameStatus::Waiting {
                return Err(GameError::GameAlreadyRunning);
            }
            if room.solo_mode {
                return Err(GameError::SoloRoom);
            }
            if room.is_full() {
                return Err(GameError::RoomFull);
            }
            if room
                .players
                .iter()
                .any(|p| p.name.eq_ignore_ascii_case(&name))
            {
                return Err(GameError::NameTaken);
            }

            let mut player = Player::new(name);
            player.color = room.available_colors().first().copied();
            let ids = (player.id, player.token.clone());
            room.players.push(player);
            room.touch();
            ids
        };

        self.tokens.write().await.insert(token.clone(), player_id);
        self.player_rooms.write().await.insert(player_id, code.clone());

        info!("player {player_id} joined room {code}");
        Ok(JoinedRoom {
            room: handle,
            room_code: code,
            player_id,
            token,
            solo_mode: false,
        })
    }

    /// Resolves a reconnection token to its player and room. Stale tokens
    /// whose room is gone are dropped on the way.
    pub async fn resolve_token(&self, token: &str) -> Option<(PlayerId, RoomHandle)> {
        let player_id = *self.tokens.read().await.get(token)?;
        match self.room_of(player_id).await {
            Some(handle) => Some((player_id, handle)),
            None => {
                self.remove_player_records(player_id).await;
                None
            }
        }
    }

    /// The room a player is currently seated in.
    pub async fn room_of(&self, player_id: PlayerId) -> Option<RoomHandle> {
        let code = self.player_rooms.read().await.get(&player_id).cloned()?;
        self.rooms.read().await.get(&code).cloned()
    }

    /// Invalidates a player's token and room mapping. The caller removes the
    /// player from the room itself while holding the room lock.
    pub async fn remove_player_records(&self, player_id: PlayerId) {
        self.player_rooms.write().await.remove(&player_id);
        self.tokens
            .write()
            .await
            .retain(|_, pid| *pid != player_id);
    }

    /// Unregisters a room and invalidates every member's records. The caller
    /// passes the locked room to avoid re-locking it here.
    pub async fn delete_room(&self, room: &mut GameRoom) {
        self.rooms.write().await.remove(&room.code);
        let members: Vec<PlayerId> = room.players.drain(..).map(|p| p.id).collect();
        let mut player_rooms = self.player_rooms.write().await;
        let mut tokens = self.tokens.write().await;
        for player_id in &members {
            player_rooms.remove(player_id);
        }
        tokens.retain(|_, pid| !members.contains(pid));
        info!("room {} deleted", room.code);
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Snapshot of all live rooms for the maintenance sweeps.
    pub async fn rooms_snapshot(&self) -> Vec<(String, RoomHandle)> {
        self.rooms
            .read()
            .await
            .iter()
            .map(|(code, handle)| (code.clone(), handle.clone()))
            .collect()
    }
}

fn random_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}

fn validate_name(name: &str) -> Result<String, GameError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(GameError::InvalidName);
    }
    Ok(name.to_string())
}
