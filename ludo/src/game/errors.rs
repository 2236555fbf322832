//! Error taxonomy for room and game operations.
//!
//! Every variant maps to one of four categories; all of them turn into an
//! `error` reply on the wire and leave room state unchanged.

use thiserror::Error;

use super::entities::Color;

/// Coarse classification used for logging and tests.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorCategory {
    /// Malformed or out-of-range input.
    Validation,
    /// A move that the rules forbid in the current state.
    IllegalMove,
    /// Acting out of turn, in the wrong room, or with a stale token.
    Authorization,
    /// A resource ceiling was hit.
    Capacity,
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum GameError {
    #[error("name must be 1-20 characters")]
    InvalidName,

    #[error("that name is already taken in this room")]
    NameTaken,

    #[error("invalid room code")]
    InvalidRoomCode,

    #[error("room not found")]
    RoomNotFound,

    #[error("you are not in a room")]
    NotInRoom,

    #[error("unknown or expired token")]
    UnknownToken,

    #[error("not your turn")]
    NotYourTurn,

    #[error("this action is only available in solo mode")]
    NotSoloRoom,

    #[error("this room is in solo mode")]
    SoloRoom,

    #[error("the game is already running")]
    GameAlreadyRunning,

    #[error("the game is not running")]
    GameNotRunning,

    #[error("the game has not finished yet")]
    GameNotFinished,

    #[error("roll the dice first")]
    MustRollFirst,

    #[error("you cannot roll the dice right now")]
    CannotRoll,

    #[error("piece not found")]
    PieceNotFound,

    #[error("color {0} is already taken")]
    ColorTaken(Color),

    #[error("colors can only be changed before the game starts")]
    ColorLocked,

    #[error("not all players are ready")]
    PlayersNotReady,

    #[error("illegal move: {0}")]
    IllegalMove(&'static str),

    #[error("room is full")]
    RoomFull,

    #[error("room limit reached, try again later")]
    TooManyRooms,

    #[error("at least {0} players required")]
    NotEnoughPlayers(usize),
}

impl GameError {
    pub fn category(&self) -> ErrorCategory {
        use GameError::*;
        match self {
            InvalidName | NameTaken | InvalidRoomCode | ColorTaken(_) | ColorLocked
            | PlayersNotReady | GameAlreadyRunning | GameNotRunning | GameNotFinished
            | PieceNotFound => ErrorCategory::Validation,
            IllegalMove(_) | MustRollFirst | CannotRoll => ErrorCategory::IllegalMove,
            RoomNotFound | NotInRoom | UnknownToken | NotYourTurn | NotSoloRoom | SoloRoom => {
                ErrorCategory::Authorization
            }
            RoomFull | TooManyRooms | NotEnoughPlayers(_) => ErrorCategory::Capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        assert_eq!(GameError::InvalidName.category(), ErrorCategory::Validation);
        assert_eq!(
            GameError::IllegalMove("overshoot").category(),
            ErrorCategory::IllegalMove
        );
        assert_eq!(
            GameError::UnknownToken.category(),
            ErrorCategory::Authorization
        );
        assert_eq!(GameError::RoomFull.category(), ErrorCategory::Capacity);
    }

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(GameError::NotYourTurn.to_string(), "not your turn");
        assert_eq!(
            GameError::ColorTaken(Color::Red).to_string(),
            "color red is already taken"
        );
    }
}
