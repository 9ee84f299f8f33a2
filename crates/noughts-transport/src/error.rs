/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listening socket failed.
    #[error("bind failed: {0}")]
    Bind(#[source] std::io::Error),

    /// Accepting a connection failed.
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    /// Connecting to a remote server failed.
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),

    /// The connection was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// A single frame could not be read, but the stream is still usable.
    /// Covers over-long lines and lines that are not valid UTF-8.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
}

impl TransportError {
    /// Returns `true` if the connection can keep reading after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedFrame(_))
    }
}
