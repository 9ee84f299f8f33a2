//! Per-connection handler: welcome, request routing, and cleanup.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`], plus a writer task that drains the connection's
//! outbox. The flow is:
//!   1. Split the socket; start the writer
//!   2. Send `welcome` (and join matchmaking when auto-join is on)
//!   3. Loop: read lines → decode → apply to the lobby
//!   4. On close, leave the queue or session

use std::sync::Arc;

use noughts_protocol::{ClientMessage, Codec, ServerMessage};
use noughts_session::{Participant, PlayerSender, SessionError};
use noughts_transport::{
    ConnectionId, FrameReader, FrameWriter, TcpConnection, TcpFrameWriter,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::server::ServerState;
use crate::NoughtsError;

/// Drop guard that removes a connection from the lobby when the handler
/// exits.
///
/// The normal path calls [`release`](Self::release). If the handler
/// panics or its task is aborted, `Drop` spawns the cleanup instead, since
/// taking the lobby lock needs `.await`. Lobby cleanup is idempotent, so a
/// second run is harmless.
struct ParticipantGuard<C: Codec> {
    conn_id: ConnectionId,
    state: Option<Arc<ServerState<C>>>,
}

impl<C: Codec> ParticipantGuard<C> {
    fn new(conn_id: ConnectionId, state: &Arc<ServerState<C>>) -> Self {
        Self {
            conn_id,
            state: Some(Arc::clone(state)),
        }
    }

    async fn release(mut self) {
        if let Some(state) = self.state.take() {
            leave(&state, self.conn_id).await;
        }
    }
}

impl<C: Codec> Drop for ParticipantGuard<C> {
    fn drop(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        let conn_id = self.conn_id;
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move { leave(&state, conn_id).await });
            }
            Err(_) => {
                tracing::warn!(%conn_id, "no runtime for lobby cleanup");
            }
        }
    }
}

async fn leave<C: Codec>(state: &ServerState<C>, conn_id: ConnectionId) {
    let departure = state.lobby.lock().await.disconnect(conn_id);
    tracing::debug!(%conn_id, ?departure, "connection left lobby");
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: TcpConnection,
    state: Arc<ServerState<C>>,
    cancel: CancellationToken,
) -> Result<(), NoughtsError> {
    let conn_id = conn.id();
    tracing::info!(%conn_id, peer = %conn.peer_addr(), "client connected");

    let (mut reader, writer) = conn.split();
    let (tx, rx) = mpsc::unbounded_channel();
    let writer_task =
        tokio::spawn(drain_outbox(conn_id, writer, rx, Arc::clone(&state)));
    let guard = ParticipantGuard::new(conn_id, &state);

    let welcome = ServerMessage::Welcome {
        message: state.config.welcome_message.clone(),
    };
    if tx.send(welcome).is_err() {
        tracing::debug!(%conn_id, "writer gone before welcome");
    }
    if state.config.auto_join {
        dispatch(&state, conn_id, &tx, ClientMessage::Join).await;
    }

    let result = loop {
        let frame = tokio::select! {
            () = cancel.cancelled() => {
                tracing::debug!(%conn_id, "closing for shutdown");
                break Ok(());
            }
            frame = reader.recv() => frame,
        };

        let line = match frame {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::info!(%conn_id, "client disconnected");
                break Ok(());
            }
            Err(e) if e.is_recoverable() => {
                tracing::debug!(%conn_id, error = %e, "discarding frame");
                continue;
            }
            Err(e) => break Err(NoughtsError::Transport(e)),
        };

        if line.trim().is_empty() {
            continue;
        }

        let msg: ClientMessage = match state.codec.decode(&line) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode message");
                continue;
            }
        };

        dispatch(&state, conn_id, &tx, msg).await;
    };

    guard.release().await;
    // The writer exits once the last strong sender is gone and the outbox
    // is drained.
    drop(tx);
    if let Err(e) = writer_task.await {
        tracing::warn!(%conn_id, error = %e, "writer task failed");
    }

    result
}

/// Applies one request to the lobby, replying with `error` on rejection.
async fn dispatch<C: Codec>(
    state: &ServerState<C>,
    conn_id: ConnectionId,
    tx: &PlayerSender,
    msg: ClientMessage,
) {
    let result: Result<(), SessionError> = {
        let mut lobby = state.lobby.lock().await;
        match msg {
            ClientMessage::Join => {
                lobby.join(Participant::new(conn_id, tx)).map(|_| ())
            }
            ClientMessage::Move {
                session_id,
                player,
                position,
            } => lobby
                .make_move(conn_id, session_id, player, position)
                .map(|_| ()),
            ClientMessage::Restart { session_id } => {
                lobby.restart(conn_id, session_id).map(|_| ())
            }
        }
    };

    if let Err(e) = result {
        tracing::debug!(%conn_id, error = %e, "request rejected");
        let reply = ServerMessage::Error {
            message: e.to_string(),
        };
        if tx.send(reply).is_err() {
            tracing::debug!(%conn_id, "writer gone; error reply dropped");
        }
    }
}

/// Encodes and writes everything queued for one connection.
///
/// Stops at the first write failure; dropping the receiver then marks the
/// participant as gone for everyone holding a weak sender.
async fn drain_outbox<C: Codec>(
    conn_id: ConnectionId,
    mut writer: TcpFrameWriter,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
    state: Arc<ServerState<C>>,
) {
    while let Some(msg) = rx.recv().await {
        let frame = match state.codec.encode(&msg) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(
                    %conn_id,
                    kind = msg.kind(),
                    error = %e,
                    "failed to encode message"
                );
                continue;
            }
        };
        if let Err(e) = writer.send(&frame).await {
            tracing::debug!(%conn_id, error = %e, "write failed");
            return;
        }
        tracing::trace!(%conn_id, kind = msg.kind(), "sent");
    }

    if let Err(e) = writer.close().await {
        tracing::debug!(%conn_id, error = %e, "close failed");
    }
}
