//! Error types for the session layer.
//!
//! The `Display` text of each variant is what the client sees in an
//! `error` reply, so the wording is part of the protocol.

use noughts_board::BoardError;
use noughts_protocol::SessionId;
use noughts_transport::ConnectionId;

/// Errors that can occur during lobby and session operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No live session has this id.
    #[error("Unknown session")]
    UnknownSession(SessionId),

    /// The caller is not seated in the session as the player it claimed.
    #[error("Not your turn or not in this session")]
    NotParticipant,

    /// The session refused the move. The board is unchanged.
    #[error("Invalid move")]
    InvalidMove(#[source] BoardError),

    /// `restart` was requested before the game finished.
    #[error("Game is still in progress")]
    GameInProgress,

    /// The caller is already waiting for an opponent.
    #[error("Already waiting for an opponent")]
    AlreadyQueued,

    /// The caller is already seated in a session.
    #[error("Already in a game")]
    AlreadySeated,

    /// The participant's outbound channel is closed.
    #[error("peer {0} is gone")]
    PeerGone(ConnectionId),
}
