//! Game rules and the shared multiplayer room for numguess.
//!
//! # Key types
//!
//! - [`GameConfig`]: range and attempt limits for both modes
//! - [`SinglePlayerGame`]: a private round owned by one session
//! - [`MultiplayerRoom`]: the shared round, as plain state
//! - [`RoomCoordinator`]: serializes access to the room and delivers
//!   the resulting [`Notice`]s
//! - [`TargetSource`]: where hidden numbers come from

mod config;
mod coordinator;
mod error;
mod logic;
mod notice;
mod room;

pub use config::GameConfig;
pub use coordinator::{Outbox, RoomCoordinator};
pub use error::RoomError;
pub use logic::{Hint, RandomTargets, ScriptedTargets, SingleOutcome, SinglePlayerGame, TargetSource};
pub use notice::Notice;
pub use room::{
    Delivery, GuessResult, Joined, Left, MemberId, MultiplayerRoom, RoomSnapshot, RoundEnd,
};
