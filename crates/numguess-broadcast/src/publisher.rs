//! In-process publish handle.

use tokio::sync::broadcast;

use crate::BroadcastEvent;

/// Events buffered per subscriber before the slowest one starts losing them.
pub const DEFAULT_CAPACITY: usize = 256;

/// Cheap-to-clone handle for publishing [`BroadcastEvent`]s.
///
/// Publishing never waits: without subscribers the event is dropped, and
/// a subscriber that falls `capacity` events behind skips ahead.
#[derive(Debug, Clone)]
pub struct Publisher {
    tx: broadcast::Sender<BroadcastEvent>,
}

impl Publisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to every current subscriber.
    pub fn publish(&self, event: BroadcastEvent) {
        // `send` only fails when nobody is listening.
        if self.tx.send(event).is_err() {
            tracing::trace!("broadcast event dropped, no subscribers");
        }
    }

    /// Registers a new in-process subscriber.
    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.tx.subscribe()
    }

    /// Number of subscribers currently attached.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Publisher {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let publisher = Publisher::default();
        publisher.publish(BroadcastEvent::RoomClosed);
        assert_eq!(publisher.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_every_subscriber_receives() {
        let publisher = Publisher::default();
        let mut a = publisher.subscribe();
        let mut b = publisher.subscribe();

        publisher.publish(BroadcastEvent::PlayerJoined { roster_size: 1 });

        assert_eq!(
            a.recv().await.unwrap(),
            BroadcastEvent::PlayerJoined { roster_size: 1 }
        );
        assert_eq!(
            b.recv().await.unwrap(),
            BroadcastEvent::PlayerJoined { roster_size: 1 }
        );
    }

    #[tokio::test]
    async fn test_slow_subscriber_lags_instead_of_blocking() {
        let publisher = Publisher::new(2);
        let mut rx = publisher.subscribe();

        for round in 0..5 {
            publisher.publish(BroadcastEvent::RoomOpened { round });
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(3))
        ));
        assert_eq!(
            rx.recv().await.unwrap(),
            BroadcastEvent::RoomOpened { round: 3 }
        );
    }
}
