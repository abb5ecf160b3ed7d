//! Unified error type for numguess.

use numguess_broadcast::BroadcastError;
use numguess_protocol::ProtocolError;
use numguess_room::RoomError;
use numguess_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Only server setup returns it to the caller. Inside a session every
/// error is logged and ends that session alone.
#[derive(Debug, thiserror::Error)]
pub enum NumguessError {
    /// A transport-level error (bind, handshake, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (stale member handle).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The broadcast endpoint could not be set up.
    #[error(transparent)]
    Broadcast(#[from] BroadcastError),

    /// The game config was rejected before anything was bound.
    #[error(transparent)]
    InvalidGameConfig(RoomError),

    /// `build` was called without a TLS server configuration.
    #[error("no TLS configuration given")]
    MissingTlsConfig,
}
