//! Single-slot matchmaking queue.

use noughts_transport::ConnectionId;

use crate::{Participant, SessionError};

/// What happened to a participant offered to the queue.
#[derive(Debug)]
pub enum Matched {
    /// Nobody was waiting; the participant now holds the slot.
    Queued,
    /// Somebody was waiting and has been taken out of the slot. They play
    /// as player one.
    Opponent(Participant),
}

/// Holds at most one participant waiting for an opponent.
#[derive(Debug, Default)]
pub struct MatchQueue {
    waiting: Option<Participant>,
}

impl MatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs `participant` with whoever is waiting, or makes it wait.
    ///
    /// A waiting participant whose connection is already gone is discarded
    /// rather than paired.
    pub fn offer(
        &mut self,
        participant: Participant,
    ) -> Result<Matched, SessionError> {
        if let Some(waiting) = self.waiting.take() {
            if waiting.id() == participant.id() {
                self.waiting = Some(waiting);
                return Err(SessionError::AlreadyQueued);
            }
            if waiting.is_connected() {
                return Ok(Matched::Opponent(waiting));
            }
            tracing::warn!(
                conn_id = %waiting.id(),
                "discarding stale waiting participant"
            );
        }
        self.waiting = Some(participant);
        Ok(Matched::Queued)
    }

    /// Removes `id` from the slot. Returns `true` if it was waiting.
    pub fn remove(&mut self, id: ConnectionId) -> bool {
        if self.is_waiting(id) {
            self.waiting = None;
            true
        } else {
            false
        }
    }

    pub fn is_waiting(&self, id: ConnectionId) -> bool {
        self.waiting.as_ref().is_some_and(|w| w.id() == id)
    }

    pub fn waiting(&self) -> Option<&Participant> {
        self.waiting.as_ref()
    }
}
