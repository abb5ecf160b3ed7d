//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A "codec" (coder/decoder) converts between Rust types and the bytes of
//! a single frame. Framing itself (where one frame ends) is the transport's
//! job; the codec only ever sees one complete frame.

use serde::{de::DeserializeOwned, Serialize};

use crate::{ClientFrame, ClientMessage, ProtocolError};

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// - `Send + Sync` → one codec value is shared by every connection task.
/// - `'static` → it lives in long-lived server state.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// Decodes a client frame, folding every failure into
/// [`ClientMessage::Invalid`].
///
/// The session loop calls this on every inbound frame. It never returns an
/// error, so a malformed frame can only ever cause a reprompt.
pub fn decode_client_message<C: Codec>(codec: &C, data: &[u8]) -> ClientMessage {
    codec
        .decode::<ClientFrame>(data)
        .and_then(ClientMessage::try_from)
        .unwrap_or_else(|e| ClientMessage::Invalid {
            reason: e.to_string(),
        })
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// `serde_json::to_vec` emits compact JSON, which never contains a raw
/// newline, so every encoded value fits on one line-framed frame.
///
/// ## Example
///
/// ```rust
/// use numguess_protocol::{Codec, Info, JsonCodec};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&Info::new("Guess a number")).unwrap();
/// assert_eq!(bytes, br#"{"message":"Guess a number"}"#);
///
/// let back: Info = codec.decode(&bytes).unwrap();
/// assert_eq!(back.text, "Guess a number");
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::GuessValue;

    #[test]
    fn test_decode_valid_guess() {
        let msg = decode_client_message(&JsonCodec, br#"{"guess":"3"}"#);
        assert_eq!(
            msg,
            ClientMessage::Guess {
                value: GuessValue::Text("3".into())
            }
        );
    }

    #[test]
    fn test_malformed_json_becomes_invalid() {
        let msg = decode_client_message(&JsonCodec, br#"{"guess": 3"#);
        assert!(matches!(msg, ClientMessage::Invalid { .. }));
    }

    #[test]
    fn test_non_object_becomes_invalid() {
        let msg = decode_client_message(&JsonCodec, b"42");
        assert!(matches!(msg, ClientMessage::Invalid { .. }));
    }

    #[test]
    fn test_wrong_field_type_becomes_invalid() {
        let msg = decode_client_message(&JsonCodec, br#"{"mode": 1}"#);
        assert!(matches!(msg, ClientMessage::Invalid { .. }));
    }

    #[test]
    fn test_missing_fields_become_invalid() {
        let msg = decode_client_message(&JsonCodec, b"{}");
        match msg {
            ClientMessage::Invalid { reason } => {
                assert!(reason.contains("expected one of"))
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }
}
