//! Error types for the protocol layer.

/// Errors that can occur while encoding, decoding, or validating messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The line is not valid JSON, has an unknown `type`, or is missing
    /// fields.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded but cannot be used in the current context,
    /// e.g. a move sent before the client has been seated.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
