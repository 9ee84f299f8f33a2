//! Codec trait and implementations for serializing messages to frames.
//!
//! A frame is one line of text, so codecs work on `&str`/`String` and never
//! emit a newline themselves; the transport adds the terminator.
//!
//! The rest of the server only sees the [`Codec`] trait. The handler is
//! generic over it, so a different wire encoding can be dropped in without
//! touching sessions or the lobby, as long as it keeps each message on a
//! single line. [`JsonCodec`] is the only implementation shipped, because
//! existing clients speak JSON and it is easy to type by hand into `nc`.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes values into single-line text frames and decodes them back.
///
/// ## Bounds
///
/// - `Send + Sync` because one codec is shared by every connection task,
///   and Tokio may run those tasks on any worker thread.
/// - `'static` because the codec lives inside the server state for as long
///   as the server runs.
///
/// ## Decoding
///
/// `decode` takes `DeserializeOwned` rather than `Deserialize<'de>`: the
/// decoded message owns its strings, so the line buffer it came from can be
/// reused for the next read straight away.
///
/// A decode failure is never fatal to a connection. The handler logs it and
/// keeps reading, so a client that sends one bad line can still play.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into one frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes one frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the frame is malformed or does not
    /// match `T`.
    fn decode<T: DeserializeOwned>(&self, frame: &str)
    -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses compact JSON (via `serde_json`).
///
/// Compact output never contains a raw newline, since string contents are
/// escaped, so every encoded value fits on one line.
///
/// ```rust
/// use noughts_protocol::{ClientMessage, Codec, JsonCodec, SessionId};
///
/// let codec = JsonCodec;
/// let frame = codec.encode(&ClientMessage::Restart { session_id: SessionId(4) }).unwrap();
/// assert_eq!(frame, r#"{"type":"restart","session_id":4}"#);
///
/// let back: ClientMessage = codec.decode(&frame).unwrap();
/// assert_eq!(back, ClientMessage::Restart { session_id: SessionId(4) });
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        frame: &str,
    ) -> Result<T, ProtocolError> {
        serde_json::from_str(frame).map_err(ProtocolError::Decode)
    }
}
