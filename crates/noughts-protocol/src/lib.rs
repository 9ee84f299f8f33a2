//! Wire protocol for Noughts.
//!
//! Every frame on the wire is one JSON object with a `type` field:
//!
//! - [`ClientMessage`]: what a client may send (`join`, `move`, `restart`)
//! - [`ServerMessage`]: what the server sends back
//! - [`Codec`] / [`JsonCodec`]: turning those into lines of text and back
//!
//! The board types ([`GameState`], [`Player`], [`Outcome`]) come from
//! `noughts-board` and are re-exported so clients only need this crate.
//!
//! ```text
//! Transport (lines) → Protocol (messages) → Session (games)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use noughts_board::{Board, Cell, GameState, Outcome, Player};
pub use types::{ClientMessage, ServerMessage, SessionId};
