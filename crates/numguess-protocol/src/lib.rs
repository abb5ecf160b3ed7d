//! Wire protocol for numguess.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`ClientMessage`], [`ClientFrame`], [`Info`], [`Mode`]) —
//!   the messages that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! The protocol layer sits between the transport (framed bytes) and the
//! game session. It doesn't know about connections or rooms.
//!
//! ```text
//! Transport (lines) → Protocol (ClientMessage / Info) → Session
//! ```

mod codec;
mod error;
mod types;

pub use codec::{decode_client_message, Codec};
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientFrame, ClientMessage, GuessValue, Info, Mode};
