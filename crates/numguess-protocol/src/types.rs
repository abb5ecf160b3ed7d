//! Message types for the numguess wire format.
//!
//! Every frame on the wire is a single JSON object. Clients send one of
//!
//! ```text
//! {"mode": "1"}        choose single player ("1"), multiplayer ("2") or "exit"
//! {"guess": "7"}       a guess, as a string or a bare integer
//! {"exit": "exit"}     leave the running game and go back to mode selection
//! ```
//!
//! and the server answers with `{"message": "..."}` frames ([`Info`]).

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// GuessValue
// ---------------------------------------------------------------------------

/// The raw value of a `guess` field.
///
/// Interactive clients forward whatever the user typed, so the value may
/// arrive as a JSON string (`"7"`, `" 7 "`, `"abc"`) or as a number (`7`).
/// `#[serde(untagged)]` lets serde try each variant in order until one
/// fits. Whether the value is a usable number is decided later by
/// [`as_number`](Self::as_number), so `"abc"` still decodes as a guess and
/// the game can answer with a format error instead of a generic one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GuessValue {
    /// A JSON integer.
    Number(i64),
    /// A JSON string, parsed on demand.
    Text(String),
}

impl GuessValue {
    /// Returns the guess as an integer, or `None` if it is not one.
    ///
    /// Strings are trimmed before parsing.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl From<i64> for GuessValue {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for GuessValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for GuessValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

// ---------------------------------------------------------------------------
// ClientFrame — the literal JSON shape
// ---------------------------------------------------------------------------

/// The JSON object a client sends, field for field.
///
/// All fields are optional on the wire; [`ClientMessage`] decides which
/// one wins. Absent fields are skipped when serializing so a client only
/// ever emits the single key it means.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guess: Option<GuessValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit: Option<String>,
}

// ---------------------------------------------------------------------------
// ClientMessage
// ---------------------------------------------------------------------------

/// A decoded client → server message.
///
/// `Invalid` is a regular variant rather than an error: a peer that sends
/// garbage gets a polite reprompt, never a dropped connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// `{"mode": ...}` — a selection at the mode prompt.
    ModeSelect { mode: String },

    /// `{"guess": ...}` — a guess inside a running round.
    Guess { value: GuessValue },

    /// `{"exit": ...}` — leave the current round.
    Exit,

    /// Anything that could not be understood.
    Invalid { reason: String },
}

impl ClientMessage {
    /// Converts back to the wire shape. `Invalid` has no wire form.
    pub fn to_frame(&self) -> Option<ClientFrame> {
        match self {
            Self::ModeSelect { mode } => Some(ClientFrame {
                mode: Some(mode.clone()),
                ..ClientFrame::default()
            }),
            Self::Guess { value } => Some(ClientFrame {
                guess: Some(value.clone()),
                ..ClientFrame::default()
            }),
            Self::Exit => Some(ClientFrame {
                exit: Some("exit".to_string()),
                ..ClientFrame::default()
            }),
            Self::Invalid { .. } => None,
        }
    }
}

/// Picks the message a frame stands for.
///
/// When a frame carries several keys, `mode` wins over `guess`, which
/// wins over `exit`.
impl TryFrom<ClientFrame> for ClientMessage {
    type Error = ProtocolError;

    fn try_from(frame: ClientFrame) -> Result<Self, Self::Error> {
        if let Some(mode) = frame.mode {
            return Ok(Self::ModeSelect { mode });
        }
        if let Some(value) = frame.guess {
            return Ok(Self::Guess { value });
        }
        if frame.exit.is_some() {
            return Ok(Self::Exit);
        }
        Err(ProtocolError::InvalidMessage(
            "expected one of \"mode\", \"guess\" or \"exit\"".into(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// What a mode selection string asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// `"1"`
    SinglePlayer,
    /// `"2"`
    Multiplayer,
    /// `"exit"`, any casing.
    Exit,
    /// Anything else, kept for the log line.
    Unknown(String),
}

impl Mode {
    /// Interprets a selection; surrounding whitespace is ignored.
    pub fn parse(selection: &str) -> Self {
        let selection = selection.trim();
        match selection {
            "1" => Self::SinglePlayer,
            "2" => Self::Multiplayer,
            s if s.eq_ignore_ascii_case("exit") => Self::Exit,
            s => Self::Unknown(s.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Info — server → client
// ---------------------------------------------------------------------------

/// A human-readable line from the server. Serialized as `{"message": text}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    #[serde(rename = "message")]
    pub text: String,
}

impl Info {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

// =========================================================================
// Tests
// =========================================================================
