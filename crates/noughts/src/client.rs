//! Client side of the protocol.
//!
//! [`Client`] wraps one TCP connection and remembers what the server has
//! told it (session, seat, latest board) so callers can send moves without
//! tracking ids themselves.

use noughts_board::{GameState, Player};
use noughts_protocol::{
    ClientMessage, Codec, JsonCodec, ProtocolError, ServerMessage, SessionId,
};
use noughts_transport::{
    FrameReader, FrameWriter, TcpConnection, TcpFrameReader, TcpFrameWriter,
};
use tokio::net::ToSocketAddrs;

use crate::NoughtsError;

/// A connection to a Noughts server.
pub struct Client {
    reader: TcpFrameReader,
    writer: TcpFrameWriter,
    codec: JsonCodec,
    session_id: Option<SessionId>,
    player: Option<Player>,
    game_state: Option<GameState>,
}

impl Client {
    /// Connects to a server. The server's `welcome` arrives through
    /// [`recv`](Self::recv) like any other message.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, NoughtsError> {
        let conn = TcpConnection::connect(addr).await?;
        tracing::debug!(conn_id = %conn.id(), peer = %conn.peer_addr(), "connected");
        let (reader, writer) = conn.split();
        Ok(Self {
            reader,
            writer,
            codec: JsonCodec,
            session_id: None,
            player: None,
            game_state: None,
        })
    }

    /// Asks to be paired with an opponent.
    pub async fn join(&mut self) -> Result<(), NoughtsError> {
        self.send(&ClientMessage::Join).await
    }

    /// Plays `position` (0-8, row-major) in the current session.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidMessage`] before a `game_start` has been
    /// received. Move legality is left to the server.
    pub async fn make_move(&mut self, position: i64) -> Result<(), NoughtsError> {
        let (session_id, player) = self.seat()?;
        self.send(&ClientMessage::Move {
            session_id,
            player: i64::from(player.number()),
            position,
        })
        .await
    }

    /// Asks for a finished game to be played again.
    pub async fn restart(&mut self) -> Result<(), NoughtsError> {
        let (session_id, _) = self.seat()?;
        self.send(&ClientMessage::Restart { session_id }).await
    }

    /// Waits for the next server message.
    ///
    /// Returns `Ok(None)` when the server closes the connection.
    pub async fn recv(&mut self) -> Result<Option<ServerMessage>, NoughtsError> {
        let line = loop {
            match self.reader.recv().await {
                Ok(Some(line)) => break line,
                Ok(None) => return Ok(None),
                Err(e) if e.is_recoverable() => {
                    tracing::debug!(error = %e, "skipping unreadable frame");
                }
                Err(e) => return Err(e.into()),
            }
        };
        let msg: ServerMessage = self.codec.decode(&line)?;
        self.observe(&msg);
        Ok(Some(msg))
    }

    /// Closes the write side; the server sees a clean disconnect.
    pub async fn close(mut self) -> Result<(), NoughtsError> {
        self.writer.close().await?;
        Ok(())
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    /// The seat assigned by the last `game_start`.
    pub fn player(&self) -> Option<Player> {
        self.player
    }

    /// The most recent game state received.
    pub fn game_state(&self) -> Option<&GameState> {
        self.game_state.as_ref()
    }

    /// Returns `true` if the game is active and it is this client's move.
    pub fn is_my_turn(&self) -> bool {
        match (self.player, &self.game_state) {
            (Some(player), Some(state)) => {
                state.game_active && state.current_player == player
            }
            _ => false,
        }
    }

    fn seat(&self) -> Result<(SessionId, Player), ProtocolError> {
        match (self.session_id, self.player) {
            (Some(session_id), Some(player)) => Ok((session_id, player)),
            _ => Err(ProtocolError::InvalidMessage(
                "not in a game yet".into(),
            )),
        }
    }

    fn observe(&mut self, msg: &ServerMessage) {
        match msg {
            ServerMessage::GameStart {
                session_id, player, ..
            } => {
                self.session_id = Some(*session_id);
                self.player = Some(*player);
            }
            ServerMessage::OpponentDisconnected => {
                self.session_id = None;
                self.player = None;
            }
            _ => {}
        }
        if let Some(state) = msg.game_state() {
            self.game_state = Some(*state);
        }
    }

    async fn send(&mut self, msg: &ClientMessage) -> Result<(), NoughtsError> {
        let frame = self.codec.encode(msg)?;
        self.writer.send(&frame).await?;
        Ok(())
    }
}
