//! Events observers can receive.

use serde::{Deserialize, Serialize};

/// A server-lifecycle or game event.
///
/// Serialized internally tagged, e.g.
/// `{"event":"round_won","round":3,"target":7}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BroadcastEvent {
    /// The game listener is accepting connections.
    ServerStarted { addr: String },

    /// The shared room was activated by its first member.
    RoomOpened { round: u64 },

    /// A player joined the shared room.
    PlayerJoined { roster_size: usize },

    /// A player left the shared room, by choice or by disconnecting.
    PlayerLeft { roster_size: usize },

    /// The last member left and the shared room went inactive.
    RoomClosed,

    /// Someone guessed the number; `target` is the number just revealed.
    RoundWon { round: u64, target: i64 },

    /// Every member ran out of attempts; `target` is the number revealed.
    RoundExhausted { round: u64, target: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(BroadcastEvent::RoundWon {
            round: 3,
            target: 7,
        })
        .unwrap();
        assert_eq!(json["event"], "round_won");
        assert_eq!(json["round"], 3);
        assert_eq!(json["target"], 7);

        let json = serde_json::to_value(BroadcastEvent::RoomClosed).unwrap();
        assert_eq!(json["event"], "room_closed");
    }
}
