//! Live sessions and which connection sits where.

use std::collections::HashMap;

use noughts_board::Player;
use noughts_protocol::SessionId;
use noughts_transport::ConnectionId;

use crate::{Participant, Session};

/// A connection's place in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seat {
    pub session_id: SessionId,
    pub player: Player,
}

/// All live sessions, plus an index from connection to seat.
///
/// A connection is seated in at most one session at a time.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
    seats: HashMap<ConnectionId, Seat>,
    next_id: u64,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            seats: HashMap::new(),
            next_id: 1,
        }
    }

    /// Creates a session with `first` as player one and `second` as player
    /// two, and seats both.
    pub fn create(
        &mut self,
        first: Participant,
        second: Participant,
    ) -> &mut Session {
        let session_id = SessionId(self.next_id);
        self.next_id += 1;

        for (participant, player) in
            [(&first, Player::One), (&second, Player::Two)]
        {
            self.seats
                .insert(participant.id(), Seat { session_id, player });
        }

        tracing::info!(
            %session_id,
            player_one = %first.id(),
            player_two = %second.id(),
            "session created"
        );
        self.sessions
            .entry(session_id)
            .or_insert_with(|| Session::new(session_id, first, second))
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    pub fn seat(&self, id: ConnectionId) -> Option<Seat> {
        self.seats.get(&id).copied()
    }

    /// Removes a session and unseats both of its participants.
    pub fn remove(&mut self, id: SessionId) -> Option<Session> {
        let session = self.sessions.remove(&id)?;
        for player in [Player::One, Player::Two] {
            self.seats.remove(&session.participant(player).id());
        }
        tracing::info!(session_id = %id, "session destroyed");
        Some(session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
