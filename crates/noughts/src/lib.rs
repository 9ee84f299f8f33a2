//! # Noughts
//!
//! Two-player tic-tac-toe over TCP.
//!
//! Clients speak newline-delimited JSON. The server pairs them two at a
//! time, enforces turns and move legality, and keeps both sides in sync.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use noughts::prelude::*;
//!
//! # async fn demo() -> Result<(), NoughtsError> {
//! let server = Server::builder().bind("127.0.0.1:5555").build().await?;
//! let handle = server.handle();
//! tokio::spawn(server.run());
//!
//! let mut alice = Client::connect("127.0.0.1:5555").await?;
//! alice.join().await?;
//! while let Some(msg) = alice.recv().await? {
//!     if alice.is_my_turn() {
//!         alice.make_move(4).await?;
//!     }
//!     # let _ = msg;
//! }
//! handle.shutdown();
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod handler;
mod server;

pub use client::Client;
pub use error::NoughtsError;
pub use server::{
    Server, ServerBuilder, ServerHandle, DEFAULT_BIND_ADDR,
    DEFAULT_WELCOME_MESSAGE,
};

pub use noughts_board as board;
pub use noughts_protocol as protocol;
pub use noughts_session as session;
pub use noughts_transport as transport;

/// Everything needed to run a server or write a client.
pub mod prelude {
    pub use crate::{Client, NoughtsError, Server, ServerBuilder, ServerHandle};
    pub use noughts_board::{
        Board, Difficulty, GameState, MoveSupplier, Opponent, Outcome, Player,
        Position,
    };
    pub use noughts_protocol::{ClientMessage, ServerMessage, SessionId};
}
