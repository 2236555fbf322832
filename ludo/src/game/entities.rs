//! Board, piece, player, and room entities.

use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt,
    time::Instant,
};
use uuid::Uuid;

use super::constants::{MAX_PLAYERS, MIN_PLAYERS, MIN_PLAYERS_SOLO, PIECES_PER_PLAYER, TRACK_LEN};

pub type PlayerId = Uuid;
pub type PieceId = Uuid;

/// One of the four player colors, each anchored to a fixed track start cell.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Blue,
    Yellow,
    Green,
}

impl Color {
    /// Assignment order for auto-picked colors and solo-mode standins.
    pub const ALL: [Color; 4] = [Color::Red, Color::Blue, Color::Green, Color::Yellow];

    /// Track cell a freshly deployed piece lands on.
    pub fn start_index(self) -> u8 {
        match self {
            Color::Red => 0,
            Color::Blue => 13,
            Color::Yellow => 26,
            Color::Green => 39,
        }
    }

    /// Last shared track cell before this color's home lane.
    pub fn entry_index(self) -> u8 {
        (self.start_index() + TRACK_LEN - 1) % TRACK_LEN
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Color::Red => "red",
            Color::Blue => "blue",
            Color::Yellow => "yellow",
            Color::Green => "green",
        };
        write!(f, "{repr}")
    }
}

/// Where a piece currently sits. Each variant carries only the position
/// fields valid for it, so an invalid (status, position) pair cannot exist.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PieceState {
    /// In the home yard, parked on the piece's fixed home slot.
    Home,
    /// On the shared circular track, cell 0..52.
    Track { pos: u8 },
    /// In the color's private lane, cell 0..4.
    Lane { pos: u8 },
    /// Done; no further moves.
    Finished,
}

impl PieceState {
    pub fn status_name(self) -> &'static str {
        match self {
            PieceState::Home => "home",
            PieceState::Track { .. } => "track",
            PieceState::Lane { .. } => "lane",
            PieceState::Finished => "finished",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Piece {
    pub id: PieceId,
    pub owner: PlayerId,
    /// Stable home-yard slot this piece returns to when captured.
    pub home_slot: u8,
    pub state: PieceState,
}

impl Piece {
    fn new(owner: PlayerId, home_slot: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            home_slot,
            state: PieceState::Home,
        }
    }

    pub fn is_on_board(&self) -> bool {
        matches!(self.state, PieceState::Track { .. } | PieceState::Lane { .. })
    }

    pub fn send_home(&mut self) {
        self.state = PieceState::Home;
    }
}

/// Per-player counters, reported in every snapshot.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct PlayerStats {
    pub turns: u32,
    pub deployments: u32,
    pub moves: u32,
    pub captures: u32,
    pub sixes: u32,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Opaque reconnection secret, shared only with this player.
    pub token: String,
    pub color: Option<Color>,
    pub pieces: Vec<Piece>,
    pub ready: bool,
    /// Solo-mode standin controlled by the solo player.
    pub is_bot: bool,
    pub stats: PlayerStats,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            name: name.into(),
            token: Uuid::new_v4().to_string(),
            color: None,
            pieces: (0..PIECES_PER_PLAYER as u8).map(|i| Piece::new(id, i)).collect(),
            ready: false,
            is_bot: false,
            stats: PlayerStats::default(),
        }
    }

    /// Pre-ready standin filling an unused color in solo mode.
    pub fn bot(color: Color) -> Self {
        let mut name = color.to_string();
        name[..1].make_ascii_uppercase();
        let mut player = Self::new(format!("Bot {name}"));
        player.color = Some(color);
        player.ready = true;
        player.is_bot = true;
        player
    }

    pub fn piece(&self, piece_id: PieceId) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.id == piece_id)
    }

    pub fn has_pieces_on_board(&self) -> bool {
        self.pieces.iter().any(Piece::is_on_board)
    }

    pub fn finished_count(&self) -> usize {
        self.pieces
            .iter()
            .filter(|p| p.state == PieceState::Finished)
            .count()
    }

    /// Resets readiness, counters, and pieces; identity, color, and token survive.
    pub fn reset_for_new_game(&mut self) {
        self.ready = false;
        self.stats = PlayerStats::default();
        for piece in &mut self.pieces {
            piece.send_home();
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Playing,
    Finished,
}

/// Authoritative state of one match and its lobby.
#[derive(Debug)]
pub struct GameRoom {
    pub code: String,
    pub status: GameStatus,
    pub players: Vec<Player>,
    pub current_player_id: Option<PlayerId>,
    pub last_dice_roll: u8,
    pub can_roll_dice: bool,
    pub winner_id: Option<PlayerId>,
    /// Remaining roll attempts per player while they have nothing on the board.
    pub deploy_attempts: HashMap<PlayerId, u8>,
    pub solo_mode: bool,
    /// The single human controlling every color in solo mode.
    pub solo_player_id: Option<PlayerId>,
    pub last_activity: Instant,
}

impl GameRoom {
    pub fn new(code: impl Into<String>, solo_mode: bool) -> Self {
        Self {
            code: code.into(),
            status: GameStatus::Waiting,
            players: Vec::new(),
            current_player_id: None,
            last_dice_roll: 0,
            can_roll_dice: true,
            winner_id: None,
            deploy_attempts: HashMap::new(),
            solo_mode,
            solo_player_id: None,
            last_activity: Instant::now(),
        }
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.player(self.current_player_id?)
    }

    /// Next seated player after `player_id`, wrapping around the table.
    /// Falls back to the first seat when `player_id` is no longer present.
    pub fn next_player_after(&self, player_id: PlayerId) -> Option<&Player> {
        if self.players.is_empty() {
            return None;
        }
        match self.players.iter().position(|p| p.id == player_id) {
            Some(idx) => self.players.get((idx + 1) % self.players.len()),
            None => self.players.first(),
        }
    }

    pub fn remove_player(&mut self, player_id: PlayerId) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.id == player_id)?;
        self.deploy_attempts.remove(&player_id);
        Some(self.players.remove(idx))
    }

    pub fn available_colors(&self) -> Vec<Color> {
        Color::ALL
            .into_iter()
            .filter(|c| !self.players.iter().any(|p| p.color == Some(*c)))
            .collect()
    }

    pub fn min_players(&self) -> usize {
        if self.solo_mode { MIN_PLAYERS_SOLO } else { MIN_PLAYERS }
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    pub fn can_start(&self) -> bool {
        self.status == GameStatus::Waiting
            && self.players.len() >= self.min_players()
            && self.players.iter().all(|p| p.ready)
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Returns the room to a fresh lobby. Player records are untouched;
    /// callers decide which players (e.g. bot standins) to drop.
    pub fn reset_to_lobby(&mut self) {
        self.status = GameStatus::Waiting;
        self.current_player_id = None;
        self.last_dice_roll = 0;
        self.can_roll_dice = true;
        self.winner_id = None;
        self.deploy_attempts.clear();
        self.solo_mode = false;
        self.solo_player_id = None;
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_anchors() {
        assert_eq!(Color::Red.start_index(), 0);
        assert_eq!(Color::Blue.start_index(), 13);
        assert_eq!(Color::Yellow.start_index(), 26);
        assert_eq!(Color::Green.start_index(), 39);

        assert_eq!(Color::Red.entry_index(), 51);
        assert_eq!(Color::Blue.entry_index(), 12);
        assert_eq!(Color::Yellow.entry_index(), 25);
        assert_eq!(Color::Green.entry_index(), 38);
    }

    #[test]
    fn new_player_has_four_home_pieces() {
        let player = Player::new("alice");
        assert_eq!(player.pieces.len(), 4);
        let slots: Vec<u8> = player.pieces.iter().map(|p| p.home_slot).collect();
        assert_eq!(slots, vec![0, 1, 2, 3]);
        assert!(player.pieces.iter().all(|p| p.state == PieceState::Home));
        assert!(!player.has_pieces_on_board());
    }

    #[test]
    fn bot_standin_is_pre_ready() {
        let bot = Player::bot(Color::Green);
        assert_eq!(bot.name, "Bot Green");
        assert!(bot.ready);
        assert!(bot.is_bot);
        assert_eq!(bot.color, Some(Color::Green));
    }

    #[test]
    fn next_player_wraps_and_survives_removal() {
        let mut room = GameRoom::new("ABCD", false);
        let a = Player::new("a");
        let b = Player::new("b");
        let c = Player::new("c");
        let (ida, idb, idc) = (a.id, b.id, c.id);
        room.players.extend([a, b, c]);

        assert_eq!(room.next_player_after(ida).unwrap().id, idb);
        assert_eq!(room.next_player_after(idc).unwrap().id, ida);

        room.remove_player(idb);
        // Unknown id falls back to the first seat.
        assert_eq!(room.next_player_after(idb).unwrap().id, ida);
    }

    #[test]
    fn available_colors_shrink_as_players_pick() {
        let mut room = GameRoom::new("ABCD", false);
        let mut p = Player::new("a");
        p.color = Some(Color::Blue);
        room.players.push(p);
        let colors = room.available_colors();
        assert_eq!(colors, vec![Color::Red, Color::Green, Color::Yellow]);
    }

    #[test]
    fn can_start_requires_everyone_ready() {
        let mut room = GameRoom::new("ABCD", false);
        room.players.push(Player::new("a"));
        room.players.push(Player::new("b"));
        assert!(!room.can_start());

        for p in &mut room.players {
            p.ready = true;
        }
        assert!(room.can_start());

        let mut solo = GameRoom::new("EFGH", true);
        let mut host = Player::new("solo");
        host.ready = true;
        solo.players.push(host);
        assert!(solo.can_start());
    }
}
