//! TCP transport with newline-delimited framing via `tokio-util` codecs.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::BytesMut;
use futures_util::{SinkExt, StreamExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio_util::codec::{
    Decoder, FramedRead, FramedWrite, LinesCodec, LinesCodecError,
};

use crate::{ConnectionId, FrameReader, FrameWriter, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Longest accepted line, in bytes, unless configured otherwise.
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 8 * 1024;

/// A TCP [`Transport`] that listens for incoming connections.
pub struct TcpTransport {
    listener: TcpListener,
    max_frame_length: usize,
}

impl TcpTransport {
    /// Binds a new TCP transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener =
            TcpListener::bind(addr).await.map_err(TransportError::Bind)?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self {
            listener,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
        })
    }

    /// Sets the longest line accepted on connections from this transport.
    pub fn with_max_frame_length(mut self, max_frame_length: usize) -> Self {
        self.max_frame_length = max_frame_length;
        self
    }
}

impl Transport for TcpTransport {
    type Connection = TcpConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::Accept)?;

        let conn = TcpConnection::new(stream, peer, self.max_frame_length);
        tracing::debug!(id = %conn.id, %peer, "accepted TCP connection");
        Ok(conn)
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// A single TCP connection, not yet split.
pub struct TcpConnection {
    id: ConnectionId,
    peer: SocketAddr,
    stream: TcpStream,
    max_frame_length: usize,
}

impl TcpConnection {
    fn new(stream: TcpStream, peer: SocketAddr, max_frame_length: usize) -> Self {
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%peer, error = %e, "failed to set TCP_NODELAY");
        }
        Self {
            id: ConnectionId::new(
                NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            ),
            peer,
            stream,
            max_frame_length,
        }
    }

    /// Dials a server.
    pub async fn connect(
        addr: impl ToSocketAddrs,
    ) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(TransportError::Connect)?;
        let peer = stream.peer_addr().map_err(TransportError::Connect)?;
        Ok(Self::new(stream, peer, DEFAULT_MAX_FRAME_LENGTH))
    }

    /// Sets the longest line this connection will accept.
    pub fn with_max_frame_length(mut self, max_frame_length: usize) -> Self {
        self.max_frame_length = max_frame_length;
        self
    }

    /// Returns the unique identifier for this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Splits the connection into independently owned halves.
    pub fn split(self) -> (TcpFrameReader, TcpFrameWriter) {
        let (read, write) = self.stream.into_split();
        let codec = FrameCodec {
            lines: LinesCodec::new_with_max_length(self.max_frame_length),
        };
        (
            TcpFrameReader {
                id: self.id,
                frames: FramedRead::new(read, codec),
            },
            TcpFrameWriter {
                id: self.id,
                frames: FramedWrite::new(write, LinesCodec::new()),
            },
        )
    }
}

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

enum Frame {
    Line(String),
    Malformed(String),
}

/// `LinesCodec` with per-line failures surfaced as items.
///
/// A decoder error ends a `FramedRead` stream, so an over-long or non-UTF-8
/// line would otherwise look like a closed connection.
struct FrameCodec {
    lines: LinesCodec,
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, io::Error> {
        classify(self.lines.decode(src))
    }

    fn decode_eof(
        &mut self,
        src: &mut BytesMut,
    ) -> Result<Option<Frame>, io::Error> {
        classify(self.lines.decode_eof(src))
    }
}

fn classify(
    result: Result<Option<String>, LinesCodecError>,
) -> Result<Option<Frame>, io::Error> {
    match result {
        Ok(line) => Ok(line.map(Frame::Line)),
        Err(LinesCodecError::MaxLineLengthExceeded) => Ok(Some(
            Frame::Malformed("line exceeds maximum length".into()),
        )),
        // The offending line has already been consumed from the buffer.
        Err(LinesCodecError::Io(e)) if e.kind() == io::ErrorKind::InvalidData => {
            Ok(Some(Frame::Malformed(e.to_string())))
        }
        Err(LinesCodecError::Io(e)) => Err(e),
    }
}

// ---------------------------------------------------------------------------
// Halves
// ---------------------------------------------------------------------------

/// The read half of a [`TcpConnection`].
pub struct TcpFrameReader {
    id: ConnectionId,
    frames: FramedRead<OwnedReadHalf, FrameCodec>,
}

impl TcpFrameReader {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl FrameReader for TcpFrameReader {
    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        match self.frames.next().await {
            Some(Ok(Frame::Line(line))) => Ok(Some(line)),
            Some(Ok(Frame::Malformed(reason))) => {
                Err(TransportError::MalformedFrame(reason))
            }
            Some(Err(e)) => Err(TransportError::ReceiveFailed(e)),
            None => Ok(None),
        }
    }
}

/// The write half of a [`TcpConnection`].
pub struct TcpFrameWriter {
    id: ConnectionId,
    frames: FramedWrite<OwnedWriteHalf, LinesCodec>,
}

impl TcpFrameWriter {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl FrameWriter for TcpFrameWriter {
    async fn send(&mut self, frame: &str) -> Result<(), TransportError> {
        self.frames.send(frame).await.map_err(|e| match e {
            LinesCodecError::Io(e) => TransportError::SendFailed(e),
            LinesCodecError::MaxLineLengthExceeded => {
                TransportError::SendFailed(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "frame too long",
                ))
            }
        })
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        SinkExt::<&str>::close(&mut self.frames)
            .await
            .map_err(|e| match e {
                LinesCodecError::Io(e) => TransportError::SendFailed(e),
                LinesCodecError::MaxLineLengthExceeded => {
                    TransportError::ConnectionClosed("close failed".into())
                }
            })
    }
}
