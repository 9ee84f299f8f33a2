//! Error types for the board engine.

use crate::Position;

/// A rejected move.
///
/// Every variant leaves the board exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// The index is outside `0..=8`.
    #[error("position {0} is off the board")]
    OutOfRange(i64),

    /// The player number is neither 1 nor 2.
    #[error("unknown player {0}")]
    UnknownPlayer(u8),

    /// The target cell already holds a mark.
    #[error("cell {0} is occupied")]
    Occupied(Position),

    /// The game has already ended.
    #[error("game is over")]
    GameOver,

    /// It is the other player's turn.
    #[error("not your turn")]
    NotYourTurn,
}
