//! Move legality and execution for a single board.
//!
//! Legality is a pure predicate; execution mutates the room and returns a
//! tagged [`MoveRecord`] describing what happened, including any capture.

use log::{debug, info};
use serde::Serialize;

use super::constants::{LANE_LEN, TRACK_LEN};
use super::entities::{GameRoom, Piece, PieceId, PieceState, Player, PlayerId};
use super::errors::GameError;

/// Outcome of a successful move, broadcast verbatim to clients.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MoveRecord {
    PieceExitedHome {
        piece_id: PieceId,
        new_position: u8,
    },
    PieceExitedHomeAndCaptured {
        piece_id: PieceId,
        new_position: u8,
        captured_piece_id: PieceId,
        captured_player_id: PlayerId,
    },
    PieceMoved {
        piece_id: PieceId,
        old_position: u8,
        new_position: u8,
    },
    PieceMovedAndCaptured {
        piece_id: PieceId,
        old_position: u8,
        new_position: u8,
        captured_piece_id: PieceId,
        captured_player_id: PlayerId,
    },
    PieceEnteredLane {
        piece_id: PieceId,
        old_position: u8,
        lane_position: u8,
        finished: bool,
    },
    PieceMovedInLane {
        piece_id: PieceId,
        old_position: u8,
        lane_position: u8,
    },
    PieceFinished {
        piece_id: PieceId,
        old_position: u8,
    },
}

fn own_piece_on_track(player: &Player, pos: u8) -> bool {
    player
        .pieces
        .iter()
        .any(|p| p.state == PieceState::Track { pos })
}

fn own_piece_in_lane(player: &Player, pos: u8) -> bool {
    player
        .pieces
        .iter()
        .any(|p| p.state == PieceState::Lane { pos })
}

/// Circular distance from `pos` to the color's lane entry cell.
fn steps_to_entry(entry: u8, pos: u8) -> u8 {
    (entry + TRACK_LEN - pos) % TRACK_LEN
}

/// Whether `piece` may legally move with this dice value.
///
/// Opponent occupancy never blocks a move (it is captured instead), so only
/// the owner's other pieces matter here.
pub fn can_move_piece(player: &Player, piece: &Piece, dice: u8) -> bool {
    let Some(color) = player.color else {
        return false;
    };
    match piece.state {
        PieceState::Finished => false,
        PieceState::Home => dice == 6 && !own_piece_on_track(player, color.start_index()),
        PieceState::Track { pos } => {
            let to_entry = steps_to_entry(color.entry_index(), pos);
            if dice > to_entry {
                let lane_pos = dice - to_entry - 1;
                lane_pos < LANE_LEN && !own_piece_in_lane(player, lane_pos)
            } else {
                !own_piece_on_track(player, (pos + dice) % TRACK_LEN)
            }
        }
        PieceState::Lane { pos } => {
            let target = pos + dice;
            if target > LANE_LEN - 1 {
                false
            } else {
                target == LANE_LEN - 1 || !own_piece_in_lane(player, target)
            }
        }
    }
}

/// Ids of every piece the player could move with this dice value.
pub fn movable_pieces(player: &Player, dice: u8) -> Vec<PieceId> {
    player
        .pieces
        .iter()
        .filter(|piece| can_move_piece(player, piece, dice))
        .map(|piece| piece.id)
        .collect()
}

/// Sends the opponent piece occupying track cell `pos` back to its home slot.
fn capture_on_track(room: &mut GameRoom, mover: PlayerId, pos: u8) -> Option<(PieceId, PlayerId)> {
    for player in room.players.iter_mut().filter(|p| p.id != mover) {
        for piece in player.pieces.iter_mut() {
            if piece.state == (PieceState::Track { pos }) {
                piece.send_home();
                info!("captured piece {} of player {} at track {pos}", piece.id, player.id);
                return Some((piece.id, player.id));
            }
        }
    }
    None
}

/// Executes a move. Fails with [`GameError::IllegalMove`] and leaves the room
/// untouched when the legality predicate rejects the (piece, dice) pair.
pub fn move_piece(
    room: &mut GameRoom,
    player_id: PlayerId,
    piece_id: PieceId,
    dice: u8,
) -> Result<MoveRecord, GameError> {
    let player_idx = room
        .players
        .iter()
        .position(|p| p.id == player_id)
        .ok_or(GameError::NotInRoom)?;

    let (state, color) = {
        let player = &room.players[player_idx];
        let piece = player.piece(piece_id).ok_or(GameError::PieceNotFound)?;
        if !can_move_piece(player, piece, dice) {
            return Err(GameError::IllegalMove("piece cannot move with this roll"));
        }
        // can_move_piece already rejected colorless players
        (piece.state, player.color.ok_or(GameError::NotYourTurn)?)
    };

    debug!("move piece={piece_id} color={color} state={state:?} dice={dice}");

    match state {
        PieceState::Home => {
            let start = color.start_index();
            let captured = capture_on_track(room, player_id, start);
            let player = &mut room.players[player_idx];
            let piece = player
                .pieces
                .iter_mut()
                .find(|p| p.id == piece_id)
                .ok_or(GameError::PieceNotFound)?;
            piece.state = PieceState::Track { pos: start };
            player.stats.deployments += 1;
            if let Some((captured_piece_id, captured_player_id)) = captured {
                player.stats.captures += 1;
                Ok(MoveRecord::PieceExitedHomeAndCaptured {
                    piece_id,
                    new_position: start,
                    captured_piece_id,
                    captured_player_id,
                })
            } else {
                Ok(MoveRecord::PieceExitedHome {
                    piece_id,
                    new_position: start,
                })
            }
        }
        PieceState::Track { pos } => {
            let to_entry = steps_to_entry(color.entry_index(), pos);
            if dice > to_entry {
                let lane_pos = dice - to_entry - 1;
                let finished = lane_pos == LANE_LEN - 1;
                let player = &mut room.players[player_idx];
                let piece = player
                    .pieces
                    .iter_mut()
                    .find(|p| p.id == piece_id)
                    .ok_or(GameError::PieceNotFound)?;
                piece.state = if finished {
                    PieceState::Finished
                } else {
                    PieceState::Lane { pos: lane_pos }
                };
                Ok(MoveRecord::PieceEnteredLane {
                    piece_id,
                    old_position: pos,
                    lane_position: lane_pos,
                    finished,
                })
            } else {
                let new_pos = (pos + dice) % TRACK_LEN;
                let captured = capture_on_track(room, player_id, new_pos);
                let player = &mut room.players[player_idx];
                let piece = player
                    .pieces
                    .iter_mut()
                    .find(|p| p.id == piece_id)
                    .ok_or(GameError::PieceNotFound)?;
                piece.state = PieceState::Track { pos: new_pos };
                player.stats.moves += 1;
                if let Some((captured_piece_id, captured_player_id)) = captured {
                    player.stats.captures += 1;
                    Ok(MoveRecord::PieceMovedAndCaptured {
                        piece_id,
                        old_position: pos,
                        new_position: new_pos,
                        captured_piece_id,
                        captured_player_id,
                    })
                } else {
                    Ok(MoveRecord::PieceMoved {
                        piece_id,
                        old_position: pos,
                        new_position: new_pos,
                    })
                }
            }
        }
        PieceState::Lane { pos } => {
            let target = pos + dice;
            let player = &mut room.players[player_idx];
            let piece = player
                .pieces
                .iter_mut()
                .find(|p| p.id == piece_id)
                .ok_or(GameError::PieceNotFound)?;
            player.stats.moves += 1;
            if target == LANE_LEN - 1 {
                piece.state = PieceState::Finished;
                Ok(MoveRecord::PieceFinished {
                    piece_id,
                    old_position: pos,
                })
            } else {
                piece.state = PieceState::Lane { pos: target };
                Ok(MoveRecord::PieceMovedInLane {
                    piece_id,
                    old_position: pos,
                    lane_position: target,
                })
            }
        }
        PieceState::Finished => Err(GameError::IllegalMove("piece already finished")),
    }
}
