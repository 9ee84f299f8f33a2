//! Message types for the Noughts wire format.
//!
//! Both enums are internally tagged with `type` in snake_case, so
//! `ServerMessage::GameStart { .. }` travels as
//! `{"type":"game_start","session_id":1,"player":2,"game_state":{..}}`.

use std::fmt;

use noughts_board::{GameState, Outcome, Player};
use serde::{Deserialize, Serialize};

/// Server-assigned identifier of a live session.
///
/// Serialized as a plain integer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Requests a client may send.
///
/// `player` and `position` are kept as raw integers: a number outside the
/// valid range still decodes and is answered with an `error` reply instead
/// of being dropped as an unreadable line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Enter matchmaking.
    Join,

    /// Place a mark.
    Move {
        session_id: SessionId,
        player: i64,
        position: i64,
    },

    /// Start a finished game over.
    Restart { session_id: SessionId },
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Everything the server sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// First frame on every connection.
    Welcome { message: String },

    /// The client is queued and no opponent is available yet.
    Waiting,

    /// The client has been paired. `player` is the seat it plays.
    GameStart {
        session_id: SessionId,
        player: Player,
        game_state: GameState,
    },

    /// State after an accepted move.
    Update { game_state: GameState },

    /// Follows the final `update` of a game. `winner` is `1`, `2`, or `3`
    /// for a draw.
    GameEnd {
        winner: Outcome,
        game_state: GameState,
    },

    /// The session was reset.
    GameRestart { game_state: GameState },

    /// A request was rejected. The session (if any) is unaffected.
    Error { message: String },

    /// The other participant left; the session no longer exists.
    OpponentDisconnected,
}

impl ServerMessage {
    /// The wire `type` tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::Waiting => "waiting",
            Self::GameStart { .. } => "game_start",
            Self::Update { .. } => "update",
            Self::GameEnd { .. } => "game_end",
            Self::GameRestart { .. } => "game_restart",
            Self::Error { .. } => "error",
            Self::OpponentDisconnected => "opponent_disconnected",
        }
    }

    /// The game state carried by this message, if any.
    pub fn game_state(&self) -> Option<&GameState> {
        match self {
            Self::GameStart { game_state, .. }
            | Self::Update { game_state }
            | Self::GameEnd { game_state, .. }
            | Self::GameRestart { game_state } => Some(game_state),
            _ => None,
        }
    }
}
