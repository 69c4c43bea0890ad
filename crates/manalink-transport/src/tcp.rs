//! TCP transport implementation on top of `tokio::net::TcpStream`.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;

use crate::{Connection, ConnectionId, Connector, TransportError};

/// Size of the buffer used for a single `recv` call.
const READ_CHUNK: usize = 8 * 1024;

/// A [`Connector`] that opens plain TCP connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Connection = TcpConnection;

    async fn connect(&self, addr: &str) -> Result<Self::Connection, TransportError> {
        let stream = TcpStream::connect(addr).await.map_err(|source| {
            TransportError::ConnectFailed {
                addr: addr.to_string(),
                source,
            }
        })?;
        TcpConnection::from_stream(stream)
    }
}

/// A single TCP connection to a game server.
///
/// The stream is split so that a pending `recv` never blocks a `send`.
pub struct TcpConnection {
    id: ConnectionId,
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
}

impl TcpConnection {
    /// Wraps an already connected stream.
    pub fn from_stream(stream: TcpStream) -> Result<Self, TransportError> {
        // Chat lines are small; waiting for Nagle coalescing only adds lag.
        stream.set_nodelay(true).map_err(TransportError::SendFailed)?;
        let id = ConnectionId::next();
        match stream.peer_addr() {
            Ok(peer) => tracing::debug!(%id, %peer, "TCP connection established"),
            Err(_) => tracing::debug!(%id, "TCP connection established"),
        }
        let (reader, writer) = stream.into_split();
        Ok(Self {
            id,
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
        })
    }
}

impl Connection for TcpConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        self.writer
            .lock()
            .await
            .write_all(data)
            .await
            .map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut buf = vec![0u8; READ_CHUNK];
        let n = self
            .reader
            .lock()
            .await
            .read(&mut buf)
            .await
            .map_err(TransportError::ReceiveFailed)?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok(Some(buf))
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
