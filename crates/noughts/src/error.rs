//! Unified error type for Noughts.

use noughts_board::BoardError;
use noughts_protocol::ProtocolError;
use noughts_session::SessionError;
use noughts_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum NoughtsError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A lobby or session rule was violated.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A board rule was violated.
    #[error(transparent)]
    Board(#[from] BoardError),
}
