//! The lobby: matchmaking queue plus session registry.
//!
//! Every operation here is synchronous and completes in one call, so the
//! server can keep the whole lobby behind one mutex and each request is a
//! single short critical section. Outbound messages are queued on the
//! participants' channels before the call returns, which gives both
//! participants the same message order.

use noughts_board::Player;
use noughts_protocol::{GameState, ServerMessage, SessionId};
use noughts_transport::ConnectionId;

use crate::{
    Matched, MatchQueue, MoveOutcome, Participant, Session, SessionError,
    SessionRegistry,
};

/// Result of [`Lobby::join`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The caller is queued and has been sent `waiting`.
    Waiting,
    /// The caller was paired; both sides have been sent `game_start`.
    Paired { session_id: SessionId, player: Player },
}

/// Result of [`Lobby::disconnect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// The connection was waiting in the queue and has been removed.
    Dequeued,
    /// The connection's session was destroyed. `notified` tells whether the
    /// opponent was still reachable for `opponent_disconnected`.
    LeftSession { session_id: SessionId, notified: bool },
    /// The connection was neither queued nor seated (or was already
    /// cleaned up).
    Unknown,
}

/// Matchmaking and every live session.
#[derive(Debug, Default)]
pub struct Lobby {
    queue: MatchQueue,
    sessions: SessionRegistry,
}

impl Lobby {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters matchmaking.
    ///
    /// # Errors
    /// [`SessionError::AlreadySeated`] if the caller is in a session,
    /// [`SessionError::AlreadyQueued`] if it is already waiting.
    pub fn join(
        &mut self,
        participant: Participant,
    ) -> Result<JoinOutcome, SessionError> {
        if self.sessions.seat(participant.id()).is_some() {
            return Err(SessionError::AlreadySeated);
        }

        match self.queue.offer(participant.clone())? {
            Matched::Queued => {
                tracing::debug!(conn_id = %participant.id(), "waiting for opponent");
                if let Err(e) = participant.send(ServerMessage::Waiting) {
                    tracing::debug!(error = %e, "waiting notice not delivered");
                }
                Ok(JoinOutcome::Waiting)
            }
            Matched::Opponent(waiting) => {
                let session = self.sessions.create(waiting, participant);
                announce_start(session);
                Ok(JoinOutcome::Paired {
                    session_id: session.id(),
                    player: Player::Two,
                })
            }
        }
    }

    /// Applies a move on behalf of `caller` and broadcasts the result.
    ///
    /// Both participants get `update`, then `game_end` if the move finished
    /// the game.
    ///
    /// # Errors
    /// - [`SessionError::UnknownSession`] if no such session is live
    /// - [`SessionError::NotParticipant`] if `caller` is not seated there
    ///   as `player`
    /// - [`SessionError::InvalidMove`] if the session refuses the move
    pub fn make_move(
        &mut self,
        caller: ConnectionId,
        session_id: SessionId,
        player: i64,
        position: i64,
    ) -> Result<MoveOutcome, SessionError> {
        let session = self.seated_session(caller, session_id)?;
        let player = match session.seat_of(caller) {
            Some(seat) if i64::from(seat.number()) == player => seat,
            _ => return Err(SessionError::NotParticipant),
        };

        let outcome = session.make_move(player, position)?;
        tracing::debug!(
            %session_id,
            conn_id = %caller,
            player = player.number(),
            position,
            "move applied"
        );

        session.broadcast(&ServerMessage::Update {
            game_state: *outcome.state(),
        });
        if let MoveOutcome::Finished { outcome: result, state } = outcome {
            tracing::info!(%session_id, winner = u8::from(result), "game finished");
            session.broadcast(&ServerMessage::GameEnd {
                winner: result,
                game_state: state,
            });
        }
        Ok(outcome)
    }

    /// Resets a finished game and broadcasts `game_restart`.
    ///
    /// # Errors
    /// - [`SessionError::UnknownSession`] if no such session is live
    /// - [`SessionError::NotParticipant`] if `caller` is not seated there
    /// - [`SessionError::GameInProgress`] if the game has not finished
    pub fn restart(
        &mut self,
        caller: ConnectionId,
        session_id: SessionId,
    ) -> Result<GameState, SessionError> {
        let session = self.seated_session(caller, session_id)?;
        let state = session.restart()?;
        tracing::info!(%session_id, conn_id = %caller, "game restarted");
        session.broadcast(&ServerMessage::GameRestart { game_state: state });
        Ok(state)
    }

    /// Forgets a connection. Safe to call more than once; only the first
    /// call has any effect.
    ///
    /// A queued connection leaves the queue. A seated connection's session
    /// is destroyed and the opponent is sent `opponent_disconnected`.
    pub fn disconnect(&mut self, caller: ConnectionId) -> Departure {
        if self.queue.remove(caller) {
            tracing::debug!(conn_id = %caller, "left matchmaking queue");
            return Departure::Dequeued;
        }

        let Some(seat) = self.sessions.seat(caller) else {
            return Departure::Unknown;
        };
        let Some(session) = self.sessions.remove(seat.session_id) else {
            return Departure::Unknown;
        };

        let notified = session
            .send(seat.player.other(), ServerMessage::OpponentDisconnected)
            .is_ok();
        tracing::info!(
            session_id = %seat.session_id,
            conn_id = %caller,
            notified,
            "participant left session"
        );
        Departure::LeftSession {
            session_id: seat.session_id,
            notified,
        }
    }

    /// Sends a message to one seat of a live session.
    pub fn send_to(
        &self,
        session_id: SessionId,
        player: Player,
        msg: ServerMessage,
    ) -> Result<(), SessionError> {
        self.sessions
            .get(session_id)
            .ok_or(SessionError::UnknownSession(session_id))?
            .send(player, msg)
    }

    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if `id` is waiting for an opponent.
    pub fn is_waiting(&self, id: ConnectionId) -> bool {
        self.queue.is_waiting(id)
    }

    /// Returns `true` if anyone is waiting for an opponent.
    pub fn has_waiter(&self) -> bool {
        self.queue.waiting().is_some()
    }

    fn seated_session(
        &mut self,
        caller: ConnectionId,
        session_id: SessionId,
    ) -> Result<&mut Session, SessionError> {
        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or(SessionError::UnknownSession(session_id))?;
        if session.seat_of(caller).is_none() {
            return Err(SessionError::NotParticipant);
        }
        Ok(session)
    }
}

fn announce_start(session: &Session) {
    let game_state = session.snapshot();
    for player in [Player::One, Player::Two] {
        let msg = ServerMessage::GameStart {
            session_id: session.id(),
            player,
            game_state,
        };
        if let Err(e) = session.send(player, msg) {
            tracing::debug!(
                session_id = %session.id(),
                error = %e,
                "game_start not delivered"
            );
        }
    }
}
