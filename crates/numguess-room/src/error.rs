//! Error types for the room layer.

use crate::MemberId;

/// Errors that can occur during room operations.
///
/// None of these should surface while sessions follow the join → guess →
/// leave discipline; they mark a stale or foreign handle.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The handle does not name a current member of the room.
    #[error("member {0} not in room")]
    NotInRoom(MemberId),

    /// A [`GameConfig`](crate::GameConfig) no round can be played with.
    #[error("invalid game config: {0}")]
    InvalidConfig(String),

    /// The room's state contradicts its own invariants.
    #[error("invalid room state: {0}")]
    InvalidState(String),
}
