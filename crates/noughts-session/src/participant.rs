//! A connected client as seen by the lobby.

use noughts_protocol::ServerMessage;
use noughts_transport::ConnectionId;
use tokio::sync::mpsc;

use crate::SessionError;

/// Channel sender for delivering outbound messages to a connection.
///
/// The connection handler owns the only strong sender; the lobby keeps
/// [`Participant`]s, which hold weak ones.
pub type PlayerSender = mpsc::UnboundedSender<ServerMessage>;

/// A connection's identity plus a weak handle to its outbox.
///
/// Holding a `Participant` never keeps a connection alive: once the handler
/// drops its sender, [`send`](Self::send) fails with
/// [`SessionError::PeerGone`].
#[derive(Debug, Clone)]
pub struct Participant {
    id: ConnectionId,
    outbox: mpsc::WeakUnboundedSender<ServerMessage>,
}

impl Participant {
    pub fn new(id: ConnectionId, sender: &PlayerSender) -> Self {
        Self {
            id,
            outbox: sender.downgrade(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns `true` while the handler and its writer are both alive.
    pub fn is_connected(&self) -> bool {
        self.outbox
            .upgrade()
            .is_some_and(|sender| !sender.is_closed())
    }

    /// Queues a message on the participant's outbox.
    pub fn send(&self, msg: ServerMessage) -> Result<(), SessionError> {
        let sender = self
            .outbox
            .upgrade()
            .ok_or(SessionError::PeerGone(self.id))?;
        sender.send(msg).map_err(|_| SessionError::PeerGone(self.id))
    }
}
