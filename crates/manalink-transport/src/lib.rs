//! Transport abstraction layer for manalink.
//!
//! The game protocol runs over a single ordered byte stream per client.
//! This crate provides:
//!
//! - [`Connection`]: one established stream that can send and receive bytes.
//! - [`Connector`]: opens a new [`Connection`] to a server address.
//! - [`TcpConnector`] / [`TcpConnection`]: the production implementation.
//! - [`MemoryConnection`]: a linked in-memory pair, used by tests and demos.
//! - [`Outbox`]: the queue handlers push finished frames into. The client
//!   loop drains it into the connection in push order.
//!
//! Nothing here knows about opcodes or message boundaries. `recv` returns
//! whatever chunk of the stream arrived; framing is the protocol crate's job.

#![allow(async_fn_in_trait)]

mod error;
mod memory;
mod outbox;
mod tcp;

pub use error::TransportError;
pub use memory::MemoryConnection;
pub use outbox::{Outbox, OutboxReceiver, outbox};
pub use tcp::{TcpConnection, TcpConnector};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique connection IDs across all transports.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-unique id.
    pub(crate) fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
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

/// Opens connections to a remote game server.
pub trait Connector: Send + Sync + 'static {
    /// The connection type produced by this connector.
    type Connection: Connection;

    /// Connects to `addr` (anything `tokio::net::lookup_host` accepts).
    async fn connect(&self, addr: &str) -> Result<Self::Connection, TransportError>;
}

/// A single ordered, reliable byte stream.
pub trait Connection: Send + Sync + 'static {
    /// Sends bytes to the remote peer. Either all bytes are written or an
    /// error is returned.
    async fn send(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Receives the next chunk of the stream.
    ///
    /// Chunk boundaries carry no meaning. Returns `Ok(None)` when the peer
    /// closed the stream cleanly.
    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError>;

    /// Closes the connection. Further sends fail.
    async fn close(&self) -> Result<(), TransportError>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
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
    fn test_connection_id_next_is_unique() {
        let a = ConnectionId::next();
        let b = ConnectionId::next();
        assert_ne!(a, b);
        assert!(b.into_inner() > a.into_inner());
    }
}
