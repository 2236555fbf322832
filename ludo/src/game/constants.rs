//! Board and room constants.

/// Number of cells on the shared circular track.
pub const TRACK_LEN: u8 = 52;

/// Number of cells in each color's private home lane.
pub const LANE_LEN: u8 = 4;

/// Pieces per player.
pub const PIECES_PER_PLAYER: usize = 4;

/// Maximum players per room (one per color).
pub const MAX_PLAYERS: usize = 4;

/// Minimum players for a normal game.
pub const MIN_PLAYERS: usize = 2;

/// Minimum players for a solo game.
pub const MIN_PLAYERS_SOLO: usize = 1;

/// Dice-roll attempts granted to a player with no pieces on the board.
pub const INITIAL_DEPLOY_ATTEMPTS: u8 = 3;

/// Maximum display name length.
pub const MAX_NAME_LEN: usize = 20;

/// Room join code length.
pub const ROOM_CODE_LEN: usize = 4;

/// Alphabet for room join codes.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
