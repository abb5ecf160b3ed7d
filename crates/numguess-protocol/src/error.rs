//! Error types for the protocol layer.
//!
//! Each numguess crate defines its own error enum. A `ProtocolError`
//! always means the bytes were fine at the transport level but did not
//! form a message the game understands.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, a field of the wrong type, or a
    /// frame cut short by the peer.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame parsed but carries none of the fields the protocol
    /// recognises.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
