//! Transport layer for Noughts.
//!
//! Turns a TCP byte stream into discrete text frames, one per line, and
//! back. A frame is any UTF-8 text terminated by `\n` (a trailing `\r` is
//! stripped). The layer knows nothing about what a frame contains.
//!
//! - [`Transport`] / [`TcpTransport`]: accepts incoming connections
//! - [`TcpConnection`]: one accepted (or dialed) connection, split into a
//!   [`FrameReader`] half and a [`FrameWriter`] half so reads and writes
//!   never wait on each other

#![allow(async_fn_in_trait)]

mod error;
mod tcp;

pub use error::TransportError;
pub use tcp::{
    TcpConnection, TcpFrameReader, TcpFrameWriter, TcpTransport,
    DEFAULT_MAX_FRAME_LENGTH,
};

use std::fmt;
use std::net::SocketAddr;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
///
/// The server's accept loop is written against this trait, not against
/// [`TcpTransport`] directly. `accept` is an `async fn` in a trait, which is
/// why this crate allows `async_fn_in_trait`: every implementation here is
/// used through generics, never as `dyn Transport`, so the missing `Send`
/// bound on the returned future does not matter.
///
/// `Connection` must be `Send + 'static` because each accepted connection
/// is moved into its own spawned task.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Send + 'static;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// Returns the address the transport is listening on.
    fn local_addr(&self) -> std::io::Result<SocketAddr>;
}

/// The receiving half of a connection.
pub trait FrameReader: Send + 'static {
    /// Receives the next frame.
    ///
    /// Returns `Ok(None)` when the peer closed the connection cleanly.
    ///
    /// ## Recoverable errors
    ///
    /// A line longer than the configured maximum, or one that is not valid
    /// UTF-8, comes back as [`TransportError::MalformedFrame`]. The reader
    /// has already skipped past the offending line by then, so the next
    /// call starts cleanly at the following one. Check
    /// [`TransportError::is_recoverable`] to tell these apart from errors
    /// that end the connection.
    async fn recv(&mut self) -> Result<Option<String>, TransportError>;
}

/// The sending half of a connection.
pub trait FrameWriter: Send + 'static {
    /// Sends one frame. The terminator is added here.
    async fn send(&mut self, frame: &str) -> Result<(), TransportError>;

    /// Flushes and shuts down the write side.
    async fn close(&mut self) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ConnectionId::new(1), "alice");
        map.insert(ConnectionId::new(2), "bob");
        assert_eq!(map[&ConnectionId::new(1)], "alice");
    }

    #[test]
    fn test_only_malformed_frames_are_recoverable() {
        assert!(TransportError::MalformedFrame("long".into()).is_recoverable());
        assert!(!TransportError::ConnectionClosed("eof".into()).is_recoverable());
    }
}
