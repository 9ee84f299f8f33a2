//! `Server` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → session.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use noughts_board::Player;
use noughts_protocol::{Codec, JsonCodec, ServerMessage, SessionId};
use noughts_session::Lobby;
use noughts_transport::{
    TcpTransport, Transport, TransportError, DEFAULT_MAX_FRAME_LENGTH,
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::handler::handle_connection;
use crate::NoughtsError;

/// Address used when [`ServerBuilder::bind`] is not called.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5555";

/// First message sent on every connection unless overridden.
pub const DEFAULT_WELCOME_MESSAGE: &str = "Connected to Tic Tac Toe server";

/// Per-connection behaviour fixed at build time.
#[derive(Debug, Clone)]
pub(crate) struct ConnectionConfig {
    pub(crate) welcome_message: String,
    pub(crate) auto_join: bool,
}

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) lobby: Mutex<Lobby>,
    pub(crate) codec: C,
    pub(crate) config: ConnectionConfig,
}

/// Builder for configuring and starting a server.
///
/// # Example
///
/// ```rust,no_run
/// # async fn start() -> Result<(), noughts::NoughtsError> {
/// let server = noughts::Server::builder()
///     .bind("0.0.0.0:5555")
///     .auto_join(true)
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ServerBuilder {
    bind_addr: String,
    welcome_message: String,
    max_frame_length: usize,
    auto_join: bool,
}

impl ServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            auto_join: false,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the text of the `welcome` message.
    pub fn welcome_message(mut self, message: impl Into<String>) -> Self {
        self.welcome_message = message.into();
        self
    }

    /// Sets the longest accepted request line, in bytes. Longer lines are
    /// discarded and the connection stays open.
    pub fn max_frame_length(mut self, bytes: usize) -> Self {
        self.max_frame_length = bytes;
        self
    }

    /// When set, every connection enters matchmaking right after the
    /// welcome, without sending `join`.
    pub fn auto_join(mut self, enabled: bool) -> Self {
        self.auto_join = enabled;
        self
    }

    /// Binds the listening socket.
    pub async fn build(self) -> Result<Server<JsonCodec>, NoughtsError> {
        let transport = TcpTransport::bind(&self.bind_addr)
            .await?
            .with_max_frame_length(self.max_frame_length);

        let state = Arc::new(ServerState {
            lobby: Mutex::new(Lobby::new()),
            codec: JsonCodec,
            config: ConnectionConfig {
                welcome_message: self.welcome_message,
                auto_join: self.auto_join,
            },
        });

        Ok(Server {
            transport,
            state,
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound server, ready to accept connections.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// accepting.
pub struct Server<C: Codec = JsonCodec> {
    transport: TcpTransport,
    state: Arc<ServerState<C>>,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl Server<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }
}

impl<C: Codec> Server<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns a handle that stays usable while the server runs.
    pub fn handle(&self) -> ServerHandle<C> {
        ServerHandle {
            state: Arc::clone(&self.state),
            cancel: self.cancel.clone(),
        }
    }

    /// Runs the accept loop until the process exits or
    /// [`ServerHandle::shutdown`] is called.
    pub async fn run(self) -> Result<(), NoughtsError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes.
    ///
    /// On shutdown the listening socket is closed, every connection
    /// handler is told to stop, and this returns once all of them have
    /// finished.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), NoughtsError> {
        let addr = self.local_addr().map_err(TransportError::Bind)?;
        tracing::info!(%addr, "Noughts server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                () = self.cancel.cancelled() => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        let cancel = self.cancel.clone();
                        self.tracker.spawn(async move {
                            let conn_id = conn.id();
                            if let Err(e) =
                                handle_connection(conn, state, cancel).await
                            {
                                tracing::debug!(
                                    %conn_id,
                                    error = %e,
                                    "connection ended with error"
                                );
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        tracing::info!(
            connections = self.tracker.len(),
            "shutting down"
        );
        drop(self.transport);
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        tracing::info!("shutdown complete");
        Ok(())
    }
}

/// Cloneable access to a running server.
pub struct ServerHandle<C: Codec = JsonCodec> {
    state: Arc<ServerState<C>>,
    cancel: CancellationToken,
}

impl<C: Codec> Clone for ServerHandle<C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            cancel: self.cancel.clone(),
        }
    }
}

impl<C: Codec> ServerHandle<C> {
    /// Sends a message to one seat of a live session.
    pub async fn send_to(
        &self,
        session_id: SessionId,
        player: Player,
        msg: ServerMessage,
    ) -> Result<(), NoughtsError> {
        let lobby = self.state.lobby.lock().await;
        lobby.send_to(session_id, player, msg)?;
        Ok(())
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.state.lobby.lock().await.session_count()
    }

    /// Whether a client is queued for an opponent.
    pub async fn has_waiter(&self) -> bool {
        self.state.lobby.lock().await.has_waiter()
    }

    /// Stops the accept loop and closes every connection.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
