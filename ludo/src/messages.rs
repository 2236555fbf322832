//! Wire protocol: client commands and server events.
//!
//! Both directions are internally tagged JSON (`{"type": ...}`). Snapshots
//! carry the full room state so clients never need to diff events.

use serde::{Deserialize, Serialize};

use crate::game::entities::{
    Color, GameRoom, GameStatus, Piece, PieceId, PieceState, Player, PlayerId, PlayerStats,
};
use crate::game::rules::MoveRecord;

/// Commands a client may send over the websocket.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom {
        name: String,
        #[serde(default)]
        solo_mode: bool,
    },
    JoinRoom {
        name: String,
        room_code: String,
    },
    Reconnect {
        token: String,
    },
    SelectColor {
        color: Color,
    },
    SetReady {
        ready: bool,
    },
    StartGame,
    RollDice,
    MovePiece {
        piece_id: PieceId,
    },
    SkipTurn,
    LeaveLobby,
    EndSoloGame,
    NewGame,
    Pong,
}

/// Events the server pushes to clients.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Private reply after create/join, carrying the reconnection token.
    Joined {
        player_id: PlayerId,
        token: String,
        room_code: String,
        solo_mode: bool,
    },
    /// Private reply after a successful reconnect.
    Reconnected {
        player_id: PlayerId,
        room_code: String,
    },
    LobbyState(LobbySnapshot),
    GameState(GameSnapshot),
    GameStarted {
        solo_mode: bool,
    },
    DiceRolled {
        player_id: PlayerId,
        player_name: String,
        dice_roll: u8,
    },
    PieceMoved {
        player_id: PlayerId,
        player_name: String,
        result: MoveRecord,
    },
    TurnSkipped {
        player_id: PlayerId,
        player_name: String,
    },
    /// A player left or was evicted for inactivity.
    PlayerDisconnected {
        player_id: PlayerId,
        player_name: String,
    },
    /// A player's socket dropped mid-game; their seat is kept for reconnect.
    PlayerConnectionLost {
        player_id: PlayerId,
        player_name: String,
    },
    /// The match was abandoned and the room returned to (or left) the lobby.
    GameReset {
        message: String,
    },
    GameEnd {
        winner_id: PlayerId,
        winner_name: String,
    },
    ReturnToLobby,
    SoloGameEnded,
    Ping,
    Error {
        message: String,
    },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error { message: message.into() }
    }
}

/// Full lobby view, broadcast to every member on any lobby change.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LobbySnapshot {
    pub room_code: String,
    pub status: GameStatus,
    pub players: Vec<LobbyPlayerView>,
    pub can_start: bool,
    pub available_colors: Vec<Color>,
    pub all_colors: Vec<Color>,
    pub solo_mode: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LobbyPlayerView {
    pub player_id: PlayerId,
    pub name: String,
    pub color: Option<Color>,
    pub ready: bool,
    pub is_bot: bool,
}

impl LobbySnapshot {
    pub fn of(room: &GameRoom) -> Self {
        Self {
            room_code: room.code.clone(),
            status: room.status,
            players: room
                .players
                .iter()
                .map(|p| LobbyPlayerView {
                    player_id: p.id,
                    name: p.name.clone(),
                    color: p.color,
                    ready: p.ready,
                    is_bot: p.is_bot,
                })
                .collect(),
            can_start: room.can_start(),
            available_colors: room.available_colors(),
            all_colors: Color::ALL.to_vec(),
            solo_mode: room.solo_mode,
        }
    }
}

/// Full game view, broadcast after every state-changing action. All pieces
/// are visible to all players.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameSnapshot {
    pub room_code: String,
    pub status: GameStatus,
    pub current_player_id: Option<PlayerId>,
    pub last_dice_roll: u8,
    pub can_roll_dice: bool,
    pub winner_id: Option<PlayerId>,
    pub solo_mode: bool,
    pub solo_player_id: Option<PlayerId>,
    pub players: Vec<PlayerView>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlayerView {
    pub player_id: PlayerId,
    pub name: String,
    pub color: Option<Color>,
    pub ready: bool,
    pub is_bot: bool,
    pub pieces: Vec<PieceView>,
    pub finished_count: usize,
    pub stats: PlayerStats,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PieceView {
    pub piece_id: PieceId,
    pub player_id: PlayerId,
    pub status: &'static str,
    /// Cell index within the piece's current area; home slot while at home,
    /// absent once finished.
    pub position: Option<u8>,
    pub home_slot: u8,
}

impl GameSnapshot {
    pub fn of(room: &GameRoom) -> Self {
        Self {
            room_code: room.code.clone(),
            status: room.status,
            current_player_id: room.current_player_id,
            last_dice_roll: room.last_dice_roll,
            can_roll_dice: room.can_roll_dice,
            winner_id: room.winner_id,
            solo_mode: room.solo_mode,
            solo_player_id: room.solo_player_id,
            players: room.players.iter().map(PlayerView::of).collect(),
        }
    }
}

impl PlayerView {
    fn of(player: &Player) -> Self {
        Self {
            player_id: player.id,
            name: player.name.clone(),
            color: player.color,
            ready: player.ready,
            is_bot: player.is_bot,
            pieces: player.pieces.iter().map(PieceView::of).collect(),
            finished_count: player.finished_count(),
            stats: player.stats,
        }
    }
}

impl PieceView {
    fn of(piece: &Piece) -> Self {
        let position = match piece.state {
            PieceState::Home => Some(piece.home_slot),
            PieceState::Track { pos } | PieceState::Lane { pos } => Some(pos),
            PieceState::Finished => None,
        };
        Self {
            piece_id: piece.id,
            player_id: piece.owner,
            status: piece.state.status_name(),
            position,
            home_slot: piece.home_slot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_deserialize_from_tagged_json() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"create_room","name":"alice"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::CreateRoom { name: "alice".into(), solo_mode: false }
        );

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"create_room","name":"alice","solo_mode":true}"#)
                .unwrap();
        assert_eq!(
            msg,
            ClientMessage::CreateRoom { name: "alice".into(), solo_mode: true }
        );

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"select_color","color":"green"}"#).unwrap();
        assert_eq!(msg, ClientMessage::SelectColor { color: Color::Green });

        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"bogus"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>("not json").is_err());
    }

    #[test]
    fn server_events_serialize_with_type_tag() {
        let json = serde_json::to_value(ServerEvent::Ping).unwrap();
        assert_eq!(json["type"], "ping");

        let json = serde_json::to_value(ServerEvent::error("nope")).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "nope");
    }

    #[test]
    fn lobby_snapshot_reflects_room() {
        let mut room = GameRoom::new("ABCD", false);
        let mut p = Player::new("alice");
        p.color = Some(Color::Red);
        room.players.push(p);

        let snapshot = LobbySnapshot::of(&room);
        assert_eq!(snapshot.room_code, "ABCD");
        assert_eq!(snapshot.players.len(), 1);
        assert!(!snapshot.can_start);
        assert_eq!(snapshot.available_colors.len(), 3);
        assert_eq!(snapshot.all_colors.len(), 4);

        let json = serde_json::to_value(ServerEvent::LobbyState(snapshot)).unwrap();
        assert_eq!(json["type"], "lobby_state");
        assert_eq!(json["players"][0]["name"], "alice");
    }

    #[test]
    fn piece_views_expose_area_positions() {
        let mut player = Player::new("alice");
        player.pieces[0].state = PieceState::Track { pos: 17 };
        player.pieces[1].state = PieceState::Lane { pos: 2 };
        player.pieces[2].state = PieceState::Finished;

        let view = PlayerView::of(&player);
        assert_eq!(view.pieces[0].status, "track");
        assert_eq!(view.pieces[0].position, Some(17));
        assert_eq!(view.pieces[1].status, "lane");
        assert_eq!(view.pieces[1].position, Some(2));
        assert_eq!(view.pieces[2].status, "finished");
        assert_eq!(view.pieces[2].position, None);
        assert_eq!(view.pieces[3].status, "home");
        assert_eq!(view.pieces[3].position, Some(3));
        assert_eq!(view.finished_count, 1);
    }

    #[test]
    fn game_snapshot_shows_everything() {
        let mut room = GameRoom::new("WXYZ", true);
        let player = Player::new("solo");
        let id = player.id;
        room.players.push(player);
        room.solo_player_id = Some(id);
        room.status = GameStatus::Playing;
        room.current_player_id = Some(id);
        room.last_dice_roll = 6;
        room.can_roll_dice = false;

        let snapshot = GameSnapshot::of(&room);
        assert_eq!(snapshot.current_player_id, Some(id));
        assert_eq!(snapshot.last_dice_roll, 6);
        assert!(snapshot.solo_mode);
        assert_eq!(snapshot.solo_player_id, Some(id));
        assert_eq!(snapshot.players[0].pieces.len(), 4);

        let json = serde_json::to_value(ServerEvent::GameState(snapshot)).unwrap();
        assert_eq!(json["type"], "game_state");
        assert_eq!(json["status"], "playing");
    }
}
