//! Client message dispatch.
//!
//! Every websocket message lands here. A handler locks the room it concerns
//! for the duration of the message, mutates it through the engine, and
//! broadcasts the resulting snapshot to every member before unlocking.

use log::{info, warn};
use ludo::game::entities::{GameRoom, GameStatus, Player};
use ludo::{
    ClientMessage, GameError, GameSnapshot, LobbySnapshot, MAX_PLAYERS, PlayerId, ServerEvent,
    constants::MIN_PLAYERS, rules, scheduler,
};

use super::connections::ClientSender;
use super::AppState;

/// Per-connection state: which player this socket speaks for.
#[derive(Debug, Default)]
pub struct Session {
    pub player_id: Option<PlayerId>,
}

/// Sends a private event down this connection's channel.
pub fn reply(tx: &ClientSender, event: &ServerEvent) {
    if let Ok(json) = serde_json::to_string(event) {
        let _ = tx.send(json);
    }
}

fn member_ids(room: &GameRoom) -> Vec<PlayerId> {
    room.players.iter().map(|p| p.id).collect()
}

async fn broadcast_lobby(state: &AppState, room: &GameRoom) {
    let event = ServerEvent::LobbyState(LobbySnapshot::of(room));
    state.connections.broadcast(&member_ids(room), &event).await;
}

async fn broadcast_game(state: &AppState, room: &GameRoom) {
    let event = ServerEvent::GameState(GameSnapshot::of(room));
    state.connections.broadcast(&member_ids(room), &event).await;
}

/// Handles one parsed client message. Errors become an `error` reply and
/// never change room state.
pub async fn dispatch(
    state: &AppState,
    session: &mut Session,
    tx: &ClientSender,
    msg: ClientMessage,
) -> Result<(), GameError> {
    if let Some(player_id) = session.player_id {
        state.connections.touch(player_id).await;
    }

    match msg {
        ClientMessage::Pong => Ok(()),
        ClientMessage::CreateRoom { name, solo_mode } => {
            leave_current_seat(state, session).await;
            let joined = state.registry.create_room(&name, solo_mode).await?;
            session.player_id = Some(joined.player_id);
            state.connections.bind(joined.player_id, tx.clone()).await;

            reply(
                tx,
                &ServerEvent::Joined {
                    player_id: joined.player_id,
                    token: joined.token,
                    room_code: joined.room_code,
                    solo_mode: joined.solo_mode,
                },
            );
            let room = joined.room.lock().await;
            broadcast_lobby(state, &room).await;
            Ok(())
        }
        ClientMessage::JoinRoom { name, room_code } => {
            leave_current_seat(state, session).await;
            let joined = state.registry.join_room(&name, &room_code).await?;
            session.player_id = Some(joined.player_id);
            state.connections.bind(joined.player_id, tx.clone()).await;

            reply(
                tx,
                &ServerEvent::Joined {
                    player_id: joined.player_id,
                    token: joined.token,
                    room_code: joined.room_code,
                    solo_mode: joined.solo_mode,
                },
            );
            let room = joined.room.lock().await;
            broadcast_lobby(state, &room).await;
            Ok(())
        }
        ClientMessage::Reconnect { token } => {
            // Resolve before touching the current seat: a bad token must not
            // cost the connection the seat it already holds.
            let (player_id, handle) = state
                .registry
                .resolve_token(&token)
                .await
                .ok_or(GameError::UnknownToken)?;
            if session.player_id != Some(player_id) {
                leave_current_seat(state, session).await;
            }
            session.player_id = Some(player_id);
            state.connections.bind(player_id, tx.clone()).await;

            let room = handle.lock().await;
            info!("player {player_id} reconnected to room {}", room.code);
            reply(
                tx,
                &ServerEvent::Reconnected {
                    player_id,
                    room_code: room.code.clone(),
                },
            );
            // Only the reconnecting player needs to catch up.
            let snapshot = match room.status {
                GameStatus::Waiting => ServerEvent::LobbyState(LobbySnapshot::of(&room)),
                GameStatus::Playing | GameStatus::Finished => {
                    ServerEvent::GameState(GameSnapshot::of(&room))
                }
            };
            reply(tx, &snapshot);
            Ok(())
        }
        ClientMessage::SelectColor { color } => {
            let (player_id, handle) = seat(state, session).await?;
            let mut room = handle.lock().await;
            if room.status != GameStatus::Waiting {
                return Err(GameError::ColorLocked);
            }
            if room
                .players
                .iter()
                .any(|p| p.id != player_id && p.color == Some(color))
            {
                return Err(GameError::ColorTaken(color));
            }
            room.player_mut(player_id)
                .ok_or(GameError::NotInRoom)?
                .color = Some(color);
            room.touch();
            broadcast_lobby(state, &room).await;
            Ok(())
        }
        ClientMessage::SetReady { ready } => {
            let (player_id, handle) = seat(state, session).await?;
            let mut room = handle.lock().await;
            if room.status != GameStatus::Waiting {
                return Err(GameError::GameAlreadyRunning);
            }
            room.player_mut(player_id)
                .ok_or(GameError::NotInRoom)?
                .ready = ready;
            room.touch();
            broadcast_lobby(state, &room).await;
            Ok(())
        }
        ClientMessage::StartGame => {
            let (_, handle) = seat(state, session).await?;
            let mut room = handle.lock().await;
            if room.status != GameStatus::Waiting {
                return Err(GameError::GameAlreadyRunning);
            }
            if room.solo_mode {
                fill_with_standins(&mut room);
            }
            scheduler::initialize_game(&mut room)?;
            room.touch();

            let solo_mode = room.solo_mode;
            state
                .connections
                .broadcast(&member_ids(&room), &ServerEvent::GameStarted { solo_mode })
                .await;
            broadcast_game(state, &room).await;
            Ok(())
        }
        ClientMessage::RollDice => {
            let (player_id, handle) = seat(state, session).await?;
            let mut room = handle.lock().await;
            let acting = acting_seat(&room, player_id)?;

            let dice = state.dice.lock().await.roll();
            scheduler::apply_roll(&mut room, dice)?;
            room.touch();

            state
                .connections
                .broadcast(
                    &member_ids(&room),
                    &ServerEvent::DiceRolled {
                        player_id: acting.0,
                        player_name: acting.1,
                        dice_roll: dice,
                    },
                )
                .await;
            broadcast_game(state, &room).await;
            Ok(())
        }
        ClientMessage::MovePiece { piece_id } => {
            let (player_id, handle) = seat(state, session).await?;
            let mut room = handle.lock().await;
            let acting = acting_seat(&room, player_id)?;
            if room.can_roll_dice {
                return Err(GameError::MustRollFirst);
            }

            let dice = room.last_dice_roll;
            let record = rules::move_piece(&mut room, acting.0, piece_id, dice)?;
            room.touch();

            state
                .connections
                .broadcast(
                    &member_ids(&room),
                    &ServerEvent::PieceMoved {
                        player_id: acting.0,
                        player_name: acting.1,
                        result: record,
                    },
                )
                .await;

            if let Some(winner_id) = scheduler::check_winner(&mut room) {
                let winner_name = room
                    .player(winner_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_default();
                state
                    .connections
                    .broadcast(
                        &member_ids(&room),
                        &ServerEvent::GameEnd { winner_id, winner_name },
                    )
                    .await;
            } else {
                scheduler::end_turn(&mut room, dice, true);
            }
            broadcast_game(state, &room).await;
            Ok(())
        }
        ClientMessage::SkipTurn => {
            let (player_id, handle) = seat(state, session).await?;
            let mut room = handle.lock().await;
            let acting = acting_seat(&room, player_id)?;
            if room.can_roll_dice {
                return Err(GameError::MustRollFirst);
            }

            let dice = room.last_dice_roll;
            scheduler::end_turn(&mut room, dice, false);
            room.touch();

            state
                .connections
                .broadcast(
                    &member_ids(&room),
                    &ServerEvent::TurnSkipped {
                        player_id: acting.0,
                        player_name: acting.1,
                    },
                )
                .await;
            broadcast_game(state, &room).await;
            Ok(())
        }
        ClientMessage::LeaveLobby => {
            let player_id = session.player_id.take().ok_or(GameError::NotInRoom)?;
            evict_player(state, player_id).await;
            state.connections.forget(player_id).await;
            Ok(())
        }
        ClientMessage::EndSoloGame => {
            let (player_id, handle) = seat(state, session).await?;
            let mut room = handle.lock().await;
            if !room.solo_mode || room.solo_player_id != Some(player_id) {
                return Err(GameError::NotSoloRoom);
            }

            state
                .connections
                .broadcast(&member_ids(&room), &ServerEvent::SoloGameEnded)
                .await;
            let members = member_ids(&room);
            state.registry.delete_room(&mut room).await;
            drop(room);
            for member in members {
                state.connections.forget(member).await;
            }
            session.player_id = None;
            Ok(())
        }
        ClientMessage::NewGame => {
            let (_, handle) = seat(state, session).await?;
            let mut room = handle.lock().await;
            if room.status != GameStatus::Finished {
                return Err(GameError::GameNotFinished);
            }

            room.players.retain(|p| !p.is_bot);
            for player in &mut room.players {
                player.reset_for_new_game();
            }
            room.reset_to_lobby();

            state
                .connections
                .broadcast(&member_ids(&room), &ServerEvent::ReturnToLobby)
                .await;
            broadcast_lobby(state, &room).await;
            Ok(())
        }
    }
}

/// Resolves this connection's seat and room.
async fn seat(
    state: &AppState,
    session: &Session,
) -> Result<(PlayerId, ludo::RoomHandle), GameError> {
    let player_id = session.player_id.ok_or(GameError::NotInRoom)?;
    let handle = state
        .registry
        .room_of(player_id)
        .await
        .ok_or(GameError::NotInRoom)?;
    Ok((player_id, handle))
}

/// The seat whose turn it is, provided this player may act for it. The solo
/// player acts for every seat in their room.
fn acting_seat(room: &GameRoom, player_id: PlayerId) -> Result<(PlayerId, String), GameError> {
    if room.status != GameStatus::Playing {
        return Err(GameError::GameNotRunning);
    }
    let current = room.current_player().ok_or(GameError::GameNotRunning)?;
    let allowed = current.id == player_id
        || (room.solo_mode && room.solo_player_id == Some(player_id));
    if !allowed {
        return Err(GameError::NotYourTurn);
    }
    Ok((current.id, current.name.clone()))
}

/// Fills the remaining seats of a solo room with pre-ready standins.
fn fill_with_standins(room: &mut GameRoom) {
    while room.players.len() < MAX_PLAYERS {
        let Some(color) = room.available_colors().first().copied() else {
            break;
        };
        room.players.push(Player::bot(color));
    }
}

/// Detaches the session's current seat before it takes a new one.
async fn leave_current_seat(state: &AppState, session: &mut Session) {
    if let Some(player_id) = session.player_id.take() {
        evict_player(state, player_id).await;
        state.connections.forget(player_id).await;
    }
}

/// Removes a player from their room for good, repairing the turn order and
/// notifying the remaining members. Shared by the explicit leave message and
/// the liveness sweep.
pub async fn evict_player(state: &AppState, player_id: PlayerId) {
    let Some(handle) = state.registry.room_of(player_id).await else {
        state.registry.remove_player_records(player_id).await;
        return;
    };
    let mut room = handle.lock().await;

    let was_current = room.current_player_id == Some(player_id);
    let next_id = room
        .next_player_after(player_id)
        .map(|p| p.id)
        .filter(|id| *id != player_id);
    let Some(player) = room.remove_player(player_id) else {
        state.registry.remove_player_records(player_id).await;
        return;
    };
    state.registry.remove_player_records(player_id).await;
    room.touch();
    info!("player {} ({player_id}) left room {}", player.name, room.code);

    let solo_host_left = room.solo_mode && room.solo_player_id == Some(player_id);
    if room.players.is_empty() || solo_host_left {
        state.registry.delete_room(&mut room).await;
        return;
    }

    let departed = ServerEvent::PlayerDisconnected {
        player_id,
        player_name: player.name,
    };

    match room.status {
        GameStatus::Waiting => {
            state.connections.broadcast(&member_ids(&room), &departed).await;
            broadcast_lobby(state, &room).await;
        }
        GameStatus::Playing if room.players.len() < MIN_PLAYERS => {
            // Not enough players to continue: the match is abandoned and the
            // room torn down.
            state
                .connections
                .broadcast(
                    &member_ids(&room),
                    &ServerEvent::GameReset {
                        message: "Not enough players left, the game was abandoned".to_string(),
                    },
                )
                .await;
            state.registry.delete_room(&mut room).await;
        }
        GameStatus::Playing => {
            state.connections.broadcast(&member_ids(&room), &departed).await;
            if was_current && let Some(next_id) = next_id {
                scheduler::pass_turn_to(&mut room, next_id);
            }
            broadcast_game(state, &room).await;
        }
        GameStatus::Finished => {
            state.connections.broadcast(&member_ids(&room), &departed).await;
            broadcast_game(state, &room).await;
        }
    }
}

/// Tells a room that one of its players dropped without leaving; the seat
/// survives until the liveness sweep gives up on them.
pub async fn report_connection_lost(state: &AppState, player_id: PlayerId) {
    let Some(handle) = state.registry.room_of(player_id).await else {
        return;
    };
    let room = handle.lock().await;
    if room.status != GameStatus::Playing {
        return;
    }
    let Some(player) = room.player(player_id) else {
        return;
    };
    warn!("player {} ({player_id}) lost connection to room {}", player.name, room.code);
    state
        .connections
        .broadcast(
            &member_ids(&room),
            &ServerEvent::PlayerConnectionLost {
                player_id,
                player_name: player.name.clone(),
            },
        )
        .await;
}
