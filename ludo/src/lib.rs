//! # Ludo
//!
//! An authoritative game engine for the Ludo board game ("Clovece, nezlob se")
//! with a concurrent room registry for hosting many simultaneous matches.
//!
//! ## Architecture
//!
//! The engine is split into small, independently testable layers:
//!
//! - **Rules**: pure move legality and move execution over a single board
//! - **Scheduler**: dice rolls, the extra-roll-on-six rule, the initial
//!   deployment budget, and turn advancement
//! - **Registry**: rooms keyed by short join codes, player membership, and
//!   opaque reconnection tokens
//! - **Messages**: the JSON wire protocol and the lobby/game snapshots that
//!   keep every client synchronized
//!
//! All room state lives in process memory; nothing is persisted.
//!
//! ## Core Modules
//!
//! - [`game`]: board entities, move rules, and the turn scheduler
//! - [`room`]: the room registry and reconnection token store
//! - [`messages`]: client/server wire protocol and state snapshots

/// Board entities, move rules, and the turn scheduler.
pub mod game;
pub use game::{
    GameError,
    constants::{self, LANE_LEN, MAX_PLAYERS, PIECES_PER_PLAYER, TRACK_LEN},
    entities::{Color, GameRoom, GameStatus, Piece, PieceId, PieceState, Player, PlayerId},
    rules::{self, MoveRecord},
    scheduler::{self, Dice},
};

/// Room registry and reconnection tokens.
pub mod room;
pub use room::{JoinedRoom, RoomHandle, RoomRegistry};

/// Client/server wire protocol and state snapshots.
pub mod messages;
pub use messages::{ClientMessage, GameSnapshot, LobbySnapshot, ServerEvent};
