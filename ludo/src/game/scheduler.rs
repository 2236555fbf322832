//! Dice and turn scheduling over a room.
//!
//! The scheduler applies a rolled dice value to the room: it computes the
//! movable set, locks the dice until a move is made, grants the extra roll
//! on a six, spends the initial deployment budget, and advances the turn.

use log::info;
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::constants::{INITIAL_DEPLOY_ATTEMPTS, PIECES_PER_PLAYER};
use super::entities::{GameRoom, GameStatus, PieceId, PlayerId};
use super::errors::GameError;
use super::rules::movable_pieces;

/// A single seeded dice source, advanced once per roll.
#[derive(Debug)]
pub struct Dice {
    rng: StdRng,
}

impl Dice {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic dice for tests.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn roll(&mut self) -> u8 {
        self.rng.random_range(1..=6)
    }
}

impl Default for Dice {
    fn default() -> Self {
        Self::new()
    }
}

/// What a dice roll did to the room.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RollOutcome {
    pub dice: u8,
    /// Pieces the current player may now move. Empty when the roll was
    /// forfeited or another deployment attempt was spent.
    pub movable: Vec<PieceId>,
    /// Whether control passed to the next player.
    pub turn_passed: bool,
}

/// Starts the match: assigns colors to players without one, resets pieces
/// and counters, and hands the first turn to seat zero.
pub fn initialize_game(room: &mut GameRoom) -> Result<(), GameError> {
    let min = room.min_players();
    if room.players.len() < min {
        return Err(GameError::NotEnoughPlayers(min));
    }
    if !room.players.iter().all(|p| p.ready) {
        return Err(GameError::PlayersNotReady);
    }

    let mut available = room.available_colors().into_iter();
    for player in &mut room.players {
        if player.color.is_none() {
            player.color = available.next();
        }
        player.reset_for_new_game();
        player.ready = true;
    }

    room.status = GameStatus::Playing;
    room.current_player_id = room.players.first().map(|p| p.id);
    room.last_dice_roll = 0;
    room.can_roll_dice = true;
    room.winner_id = None;
    room.deploy_attempts = room
        .players
        .iter()
        .map(|p| (p.id, INITIAL_DEPLOY_ATTEMPTS))
        .collect();

    info!("game started in room {} with {} players", room.code, room.players.len());
    Ok(())
}

/// Applies a rolled dice value for the current player.
pub fn apply_roll(room: &mut GameRoom, dice: u8) -> Result<RollOutcome, GameError> {
    if room.status != GameStatus::Playing {
        return Err(GameError::GameNotRunning);
    }
    if !room.can_roll_dice {
        return Err(GameError::CannotRoll);
    }
    let current_id = room.current_player_id.ok_or(GameError::GameNotRunning)?;

    room.last_dice_roll = dice;
    if dice == 6
        && let Some(player) = room.player_mut(current_id)
    {
        player.stats.sixes += 1;
    }

    let (on_board, movable) = {
        let player = room.player(current_id).ok_or(GameError::GameNotRunning)?;
        (player.has_pieces_on_board(), movable_pieces(player, dice))
    };

    if !movable.is_empty() {
        // The player must move before rolling again.
        room.can_roll_dice = false;
        return Ok(RollOutcome {
            dice,
            movable,
            turn_passed: false,
        });
    }

    if dice == 6 || on_board {
        // No legal move: the roll is forfeited, a six included.
        end_turn(room, dice, false);
        return Ok(RollOutcome {
            dice,
            movable: Vec::new(),
            turn_passed: true,
        });
    }

    // Nothing on the board and no six: spend a deployment attempt.
    let remaining = room
        .deploy_attempts
        .entry(current_id)
        .or_insert(INITIAL_DEPLOY_ATTEMPTS);
    *remaining = remaining.saturating_sub(1);
    if *remaining == 0 {
        end_turn(room, dice, false);
        Ok(RollOutcome {
            dice,
            movable: Vec::new(),
            turn_passed: true,
        })
    } else {
        // Same player rolls again; the dice stays unlocked.
        Ok(RollOutcome {
            dice,
            movable: Vec::new(),
            turn_passed: false,
        })
    }
}

/// Ends the current turn segment.
///
/// A six after a successful move grants the same player another roll;
/// anything else resets the dice and advances to the next seat, restoring
/// that player's deployment budget if they have nothing on the board.
pub fn end_turn(room: &mut GameRoom, dice: u8, after_move: bool) {
    let Some(current_id) = room.current_player_id else {
        return;
    };

    let keeps_turn = after_move && dice == 6;
    if !keeps_turn
        && let Some(player) = room.player_mut(current_id)
    {
        player.stats.turns += 1;
    }
    if keeps_turn {
        room.can_roll_dice = true;
        return;
    }

    room.last_dice_roll = 0;
    if let Some(next_id) = room.next_player_after(current_id).map(|p| p.id) {
        pass_turn_to(room, next_id);
    } else {
        room.can_roll_dice = true;
    }
}

/// Hands the turn to `next_id`, resetting the dice and, when that player has
/// nothing on the board, their deployment budget.
pub fn pass_turn_to(room: &mut GameRoom, next_id: PlayerId) {
    room.current_player_id = Some(next_id);
    room.last_dice_roll = 0;
    room.can_roll_dice = true;
    if room
        .player(next_id)
        .is_some_and(|p| !p.has_pieces_on_board())
    {
        room.deploy_attempts.insert(next_id, INITIAL_DEPLOY_ATTEMPTS);
    }
}

/// Ends the game if some player has all four pieces finished.
pub fn check_winner(room: &mut GameRoom) -> Option<PlayerId> {
    let winner = room
        .players
        .iter()
        .find(|p| p.finished_count() == PIECES_PER_PLAYER)?
        .id;
    room.status = GameStatus::Finished;
    room.winner_id = Some(winner);
    info!("game in room {} won by {winner}", room.code);
    Some(winner)
}
