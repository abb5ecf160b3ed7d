//! Transport abstraction layer for numguess.
//!
//! Provides the [`Transport`], [`Handshake`] and [`Connection`] traits and
//! their TLS-over-TCP implementation. Messages are framed as single lines
//! (see [`LineConnection`]), so a message boundary never depends on how the
//! byte stream happens to be chunked by the network.

mod error;
mod line;
mod tls;

pub use error::TransportError;
pub use line::{LineConnection, MAX_FRAME_LEN};
pub use tls::{
    build_server_config, connect, load_client_config, load_server_config,
    PendingTls, TlsClientConnection, TlsConnection, TlsTransport,
};

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates a process-unique `ConnectionId`.
    pub fn next() -> Self {
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

/// Accepts new incoming connections.
///
/// `accept` only takes the raw socket off the listener. The returned
/// [`Handshake`] finishes channel setup, which callers run in the
/// connection's own task so a slow peer cannot stall the accept loop.
pub trait Transport: Send + Sync + 'static {
    /// A connection that has been accepted but not yet secured.
    type Pending: Handshake;

    /// Waits for and accepts the next incoming socket.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Pending, TransportError>> + Send;

    /// Returns the address the listener is bound to.
    fn local_addr(&self) -> std::io::Result<SocketAddr>;
}

/// Completes the setup of an accepted socket.
pub trait Handshake: Send + 'static {
    /// The connection type produced once the handshake succeeds.
    type Connection: Connection;

    /// Address of the remote peer.
    fn peer_addr(&self) -> SocketAddr;

    /// Runs the handshake and yields a ready connection.
    fn complete(
        self,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// A single connection that can send and receive framed messages.
pub trait Connection: Send + Sync + 'static {
    /// Sends one message to the remote peer.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next message from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;

    /// Closes the sending side of the connection.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
