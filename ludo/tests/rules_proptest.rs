//! Property tests for the track and lane arithmetic.

use ludo::game::entities::{GameRoom, PieceState, Player};
use ludo::{Color, LANE_LEN, MoveRecord, TRACK_LEN, rules};
use proptest::prelude::*;

fn lone_piece_room(color: Color, state: PieceState) -> (GameRoom, ludo::PlayerId, ludo::PieceId) {
    let mut room = GameRoom::new("PROP", false);
    let mut player = Player::new("p");
    player.color = Some(color);
    player.pieces[0].state = state;
    let (player_id, piece_id) = (player.id, player.pieces[0].id);
    room.players.push(player);
    (room, player_id, piece_id)
}

fn any_color() -> impl Strategy<Value = Color> {
    prop_oneof![
        Just(Color::Red),
        Just(Color::Blue),
        Just(Color::Yellow),
        Just(Color::Green),
    ]
}

proptest! {
    // A lone piece on the track always has a legal move, and the landing
    // cell follows the circular arithmetic exactly.
    #[test]
    fn track_moves_stay_on_the_board(
        color in any_color(),
        pos in 0..TRACK_LEN,
        dice in 1..=6u8,
    ) {
        let (mut room, player_id, piece_id) =
            lone_piece_room(color, PieceState::Track { pos });
        let to_entry = (color.entry_index() + TRACK_LEN - pos) % TRACK_LEN;

        let record = rules::move_piece(&mut room, player_id, piece_id, dice);
        if dice > to_entry {
            // Entering the lane: legal only when the lane index fits.
            let lane_pos = dice - to_entry - 1;
            if lane_pos < LANE_LEN {
                prop_assert_eq!(record.unwrap(), MoveRecord::PieceEnteredLane {
                    piece_id,
                    old_position: pos,
                    lane_position: lane_pos,
                    finished: lane_pos == LANE_LEN - 1,
                });
            } else {
                prop_assert!(record.is_err());
            }
        } else {
            prop_assert_eq!(record.unwrap(), MoveRecord::PieceMoved {
                piece_id,
                old_position: pos,
                new_position: (pos + dice) % TRACK_LEN,
            });
        }

        // Whatever happened, the piece sits in a valid cell.
        match room.players[0].pieces[0].state {
            PieceState::Track { pos } => prop_assert!(pos < TRACK_LEN),
            PieceState::Lane { pos } => prop_assert!(pos < LANE_LEN),
            PieceState::Finished | PieceState::Home => {}
        }
    }

    // Lane moves land exactly or not at all.
    #[test]
    fn lane_moves_land_exactly(
        color in any_color(),
        pos in 0..LANE_LEN,
        dice in 1..=6u8,
    ) {
        let (mut room, player_id, piece_id) =
            lone_piece_room(color, PieceState::Lane { pos });
        let record = rules::move_piece(&mut room, player_id, piece_id, dice);

        let target = pos + dice;
        if target > LANE_LEN - 1 {
            prop_assert!(record.is_err());
            prop_assert_eq!(room.players[0].pieces[0].state, PieceState::Lane { pos });
        } else if target == LANE_LEN - 1 {
            prop_assert_eq!(record.unwrap(), MoveRecord::PieceFinished {
                piece_id,
                old_position: pos,
            });
        } else {
            prop_assert_eq!(record.unwrap(), MoveRecord::PieceMovedInLane {
                piece_id,
                old_position: pos,
                lane_position: target,
            });
        }
    }

    // Execution succeeds exactly when the legality predicate says so.
    #[test]
    fn legality_predicts_execution(
        color in any_color(),
        own_track in proptest::collection::vec(0..TRACK_LEN, 0..3),
        pos in 0..TRACK_LEN,
        dice in 1..=6u8,
    ) {
        let (mut room, player_id, piece_id) =
            lone_piece_room(color, PieceState::Track { pos });
        for (i, cell) in own_track.iter().enumerate() {
            room.players[0].pieces[i + 1].state = PieceState::Track { pos: *cell };
        }

        let legal = {
            let player = &room.players[0];
            rules::can_move_piece(player, player.piece(piece_id).unwrap(), dice)
        };
        prop_assert_eq!(
            rules::move_piece(&mut room, player_id, piece_id, dice).is_ok(),
            legal
        );
    }

    // A failed move never mutates the board.
    #[test]
    fn rejected_moves_leave_state_untouched(
        color in any_color(),
        pos in 0..LANE_LEN,
        blocker in 0..LANE_LEN,
        dice in 1..=6u8,
    ) {
        let (mut room, player_id, piece_id) =
            lone_piece_room(color, PieceState::Lane { pos });
        room.players[0].pieces[1].state = PieceState::Lane { pos: blocker };
        let before: Vec<PieceState> =
            room.players[0].pieces.iter().map(|p| p.state).collect();

        if rules::move_piece(&mut room, player_id, piece_id, dice).is_err() {
            let after: Vec<PieceState> =
                room.players[0].pieces.iter().map(|p| p.state).collect();
            prop_assert_eq!(before, after);
        }
    }
}
