//! Sessions and matchmaking for Noughts.
//!
//! - [`Session`]: one game between two [`Participant`]s, with the move and
//!   restart rules
//! - [`MatchQueue`]: the single waiting slot
//! - [`SessionRegistry`]: live sessions and who is seated where
//! - [`Lobby`]: the queue and the registry together; the only type the
//!   server talks to
//!
//! Nothing in this crate does I/O. Messages for clients are pushed onto
//! each participant's outbound channel and written by the connection
//! layer.

mod error;
mod lobby;
mod participant;
mod queue;
mod registry;
mod session;

pub use error::SessionError;
pub use lobby::{Departure, JoinOutcome, Lobby};
pub use participant::{Participant, PlayerSender};
pub use queue::{MatchQueue, Matched};
pub use registry::{Seat, SessionRegistry};
pub use session::{MoveOutcome, Session, SessionPhase};
