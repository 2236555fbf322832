//! End-to-end match flows driven through the public engine API.

use ludo::game::entities::{GameRoom, GameStatus, PieceState, Player};
use ludo::game::{GameError, scheduler};
use ludo::{Color, MoveRecord, PIECES_PER_PLAYER, rules};

fn ready_room(names: &[&str]) -> GameRoom {
    let mut room = GameRoom::new("FLOW", false);
    for name in names {
        let mut player = Player::new(*name);
        player.ready = true;
        room.players.push(player);
    }
    room
}

#[test]
fn opening_turns_deploy_and_advance() {
    let mut room = ready_room(&["red", "blue"]);
    scheduler::initialize_game(&mut room).unwrap();
    let red = room.players[0].id;
    let blue = room.players[1].id;

    // Red rolls a six: the dice locks until the move is made.
    let outcome = scheduler::apply_roll(&mut room, 6).unwrap();
    assert_eq!(outcome.movable.len(), PIECES_PER_PLAYER);
    assert!(!room.can_roll_dice);

    let record = rules::move_piece(&mut room, red, outcome.movable[0], 6).unwrap();
    assert!(matches!(record, MoveRecord::PieceExitedHome { new_position: 0, .. }));
    scheduler::end_turn(&mut room, 6, true);

    // The six earned an extra roll; red stays on turn.
    assert_eq!(room.current_player_id, Some(red));
    assert!(room.can_roll_dice);

    // Red advances the deployed piece, then the turn passes to blue.
    let outcome = scheduler::apply_roll(&mut room, 1).unwrap();
    let record = rules::move_piece(&mut room, red, outcome.movable[0], 1).unwrap();
    assert_eq!(
        record,
        MoveRecord::PieceMoved {
            piece_id: outcome.movable[0],
            old_position: 0,
            new_position: 1,
        }
    );
    scheduler::end_turn(&mut room, 1, true);
    assert_eq!(room.current_player_id, Some(blue));

    // Blue deploys onto its own start cell.
    let outcome = scheduler::apply_roll(&mut room, 6).unwrap();
    let record = rules::move_piece(&mut room, blue, outcome.movable[0], 6).unwrap();
    assert!(matches!(record, MoveRecord::PieceExitedHome { new_position: 13, .. }));

    let red_stats = room.players[0].stats;
    assert_eq!(red_stats.sixes, 1);
    assert_eq!(red_stats.deployments, 1);
    assert_eq!(red_stats.moves, 1);
    assert_eq!(red_stats.turns, 1);
}

#[test]
fn capture_sends_the_victim_home() {
    let mut room = ready_room(&["red", "blue"]);
    scheduler::initialize_game(&mut room).unwrap();
    let red = room.players[0].id;
    let blue = room.players[1].id;

    let attacker = {
        let player = room.player_mut(red).unwrap();
        player.pieces[0].state = PieceState::Track { pos: 10 };
        player.pieces[0].id
    };
    let victim = {
        let player = room.player_mut(blue).unwrap();
        player.pieces[0].state = PieceState::Track { pos: 14 };
        player.pieces[0].id
    };

    let outcome = scheduler::apply_roll(&mut room, 4).unwrap();
    assert_eq!(outcome.movable, vec![attacker]);

    let record = rules::move_piece(&mut room, red, attacker, 4).unwrap();
    assert_eq!(
        record,
        MoveRecord::PieceMovedAndCaptured {
            piece_id: attacker,
            old_position: 10,
            new_position: 14,
            captured_piece_id: victim,
            captured_player_id: blue,
        }
    );
    assert_eq!(room.player(blue).unwrap().pieces[0].state, PieceState::Home);
    assert_eq!(room.player(red).unwrap().stats.captures, 1);

    // Blue can redeploy the captured piece later with a six.
    scheduler::end_turn(&mut room, 4, true);
    assert_eq!(room.current_player_id, Some(blue));
    let outcome = scheduler::apply_roll(&mut room, 6).unwrap();
    assert!(outcome.movable.contains(&victim));
}

#[test]
fn finishing_the_last_piece_wins() {
    let mut room = ready_room(&["red", "blue"]);
    scheduler::initialize_game(&mut room).unwrap();
    let red = room.players[0].id;

    let last = {
        let player = room.player_mut(red).unwrap();
        for piece in &mut player.pieces[..3] {
            piece.state = PieceState::Finished;
        }
        player.pieces[3].state = PieceState::Lane { pos: 1 };
        player.pieces[3].id
    };

    let outcome = scheduler::apply_roll(&mut room, 2).unwrap();
    assert_eq!(outcome.movable, vec![last]);
    let record = rules::move_piece(&mut room, red, last, 2).unwrap();
    assert_eq!(record, MoveRecord::PieceFinished { piece_id: last, old_position: 1 });

    assert_eq!(scheduler::check_winner(&mut room), Some(red));
    assert_eq!(room.status, GameStatus::Finished);
    assert_eq!(room.winner_id, Some(red));
    assert_eq!(room.player(red).unwrap().finished_count(), PIECES_PER_PLAYER);

    // No more rolls once the game is over.
    assert_eq!(
        scheduler::apply_roll(&mut room, 6).unwrap_err(),
        GameError::GameNotRunning
    );
}

#[test]
fn failed_deployments_rotate_through_players() {
    let mut room = ready_room(&["a", "b", "c"]);
    scheduler::initialize_game(&mut room).unwrap();
    let ids: Vec<_> = room.players.iter().map(|p| p.id).collect();

    // Each player gets three non-six rolls before the turn moves on.
    for (i, id) in ids.iter().enumerate() {
        for _ in 0..3 {
            assert_eq!(room.current_player_id, Some(*id));
            scheduler::apply_roll(&mut room, 5).unwrap();
        }
        assert_eq!(room.current_player_id, Some(ids[(i + 1) % ids.len()]));
    }

    // The first player starts the next lap with a fresh budget.
    assert_eq!(room.current_player_id, Some(ids[0]));
    assert_eq!(room.deploy_attempts[&ids[0]], 3);
}

#[test]
fn lane_entry_from_a_full_lap() {
    let mut room = ready_room(&["red", "blue"]);
    scheduler::initialize_game(&mut room).unwrap();
    let blue = room.players[1].id;
    room.current_player_id = Some(blue);

    // Blue's lane entry is cell 12. From 9, a 5 overshoots into lane index 1.
    let piece = {
        let player = room.player_mut(blue).unwrap();
        player.pieces[0].state = PieceState::Track { pos: 9 };
        player.pieces[0].id
    };
    assert_eq!(Color::Blue.entry_index(), 12);

    scheduler::apply_roll(&mut room, 5).unwrap();
    let record = rules::move_piece(&mut room, blue, piece, 5).unwrap();
    assert_eq!(
        record,
        MoveRecord::PieceEnteredLane {
            piece_id: piece,
            old_position: 9,
            lane_position: 1,
            finished: false,
        }
    );
}
