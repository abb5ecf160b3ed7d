//! Coordinator: the single point through which sessions touch the room.

use std::sync::Arc;

use numguess_broadcast::{BroadcastEvent, Publisher};
use tokio::sync::{mpsc, Mutex};

use crate::{
    Delivery, GameConfig, MemberId, MultiplayerRoom, Notice, RoomError, RoomSnapshot, RoundEnd,
    TargetSource,
};

/// Outbound queue of one connection. Drained by that connection's writer.
pub type Outbox = mpsc::UnboundedSender<Notice>;

/// Serializes every room operation behind one lock.
///
/// Each operation holds the lock while the room computes its next state
/// and while the results are queued: notices go into the recipients'
/// outboxes and events into the publisher, in the order the operations
/// took the lock. Neither queue blocks, and the socket writes happen later
/// in each connection's writer task.
pub struct RoomCoordinator {
    room: Mutex<MultiplayerRoom<Outbox>>,
    config: GameConfig,
    publisher: Publisher,
}

impl RoomCoordinator {
    pub fn new(config: GameConfig, targets: Arc<dyn TargetSource>, publisher: Publisher) -> Self {
        Self {
            room: Mutex::new(MultiplayerRoom::new(config, targets)),
            config,
            publisher,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Adds the owner of `outbox` to the room.
    pub async fn join(&self, outbox: Outbox) -> MemberId {
        let mut room = self.room.lock().await;
        let joined = room.join(outbox);

        if joined.opened {
            tracing::info!(round = joined.round, "room opened");
            self.publisher.publish(BroadcastEvent::RoomOpened {
                round: joined.round,
            });
        }
        tracing::info!(
            member = %joined.id,
            roster = joined.roster_size,
            "member joined"
        );
        self.publisher.publish(BroadcastEvent::PlayerJoined {
            roster_size: joined.roster_size,
        });
        joined.id
    }

    /// Removes a member.
    pub async fn leave(&self, member: MemberId) -> Result<(), RoomError> {
        let mut room = self.room.lock().await;
        let left = match room.leave(member) {
            Ok(left) => left,
            Err(e) => {
                tracing::warn!(%member, error = %e, "dropping leave");
                return Err(e);
            }
        };

        tracing::info!(%member, roster = left.roster_size, "member left");
        self.publisher.publish(BroadcastEvent::PlayerLeft {
            roster_size: left.roster_size,
        });
        if left.closed {
            tracing::info!("room closed");
            self.publisher.publish(BroadcastEvent::RoomClosed);
        }
        Ok(())
    }

    /// Plays a guess and delivers whatever notices it produced.
    pub async fn guess(&self, member: MemberId, value: i64) -> Result<(), RoomError> {
        let mut room = self.room.lock().await;
        let result = match room.guess(member, value) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(%member, value, error = %e, "dropping guess");
                return Err(e);
            }
        };

        match result.round_end {
            Some(RoundEnd::Won {
                winner,
                round,
                target,
            }) => {
                tracing::info!(%winner, round, target, "round won");
                self.publisher
                    .publish(BroadcastEvent::RoundWon { round, target });
            }
            Some(RoundEnd::Exhausted { round, target }) => {
                tracing::info!(round, target, "round exhausted");
                self.publisher
                    .publish(BroadcastEvent::RoundExhausted { round, target });
            }
            None => {}
        }

        dispatch(result.deliveries);
        Ok(())
    }

    pub async fn snapshot(&self) -> RoomSnapshot {
        self.room.lock().await.snapshot()
    }
}

/// Enqueues each delivery on its own. A closed outbox belongs to a session
/// that is already going away; its notice is dropped.
fn dispatch(deliveries: Vec<Delivery<Outbox>>) {
    for delivery in deliveries {
        if delivery.address.send(delivery.notice).is_err() {
            tracing::warn!(
                member = %delivery.to,
                notice = ?delivery.notice,
                "outbox closed, notice dropped"
            );
        }
    }
}
