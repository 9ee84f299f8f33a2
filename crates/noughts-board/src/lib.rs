//! Board engine for Noughts.
//!
//! Pure game rules with no I/O:
//!
//! - [`Board`]: the 3×3 grid, move legality ([`Board::apply`]) and
//!   win/draw detection ([`Board::winner`])
//! - [`GameState`]: the snapshot clients render
//! - [`MoveSupplier`]: computer opponents ([`FirstAvailable`], [`Opponent`])
//! - [`LocalGame`]: a human-versus-computer game that reports
//!   [`GameEvent`]s
//!
//! Every layer above (protocol, session, server) builds on these types.

mod ai;
mod board;
mod error;
mod local;

pub use ai::{best_move, Difficulty, FirstAvailable, MoveSupplier, Opponent};
pub use board::{
    Board, Cell, GameState, Outcome, Player, Position, DRAW_CODE,
};
pub use error::BoardError;
pub use local::{GameEvent, LocalGame};
