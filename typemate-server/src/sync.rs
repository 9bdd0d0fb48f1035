use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

use typemate_core::RoomEvent;
use typemate_types::RoomId;

const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Per-room broadcast of changes written to room and player records.
///
/// Every connection in a room holds a receiver; publishers never block and
/// a slow receiver skips ahead to the newest events.
pub struct ChangeFeed {
    channels: DashMap<RoomId, broadcast::Sender<RoomEvent>>,
    capacity: usize,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn subscribe(&self, room_id: RoomId) -> broadcast::Receiver<RoomEvent> {
        self.channels
            .entry(room_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Returns the number of receivers the event reached
    pub fn publish(&self, event: RoomEvent) -> usize {
        let room_id = event.room_id();
        match self.channels.get(&room_id) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => {
                debug!("No subscribers for room {}", room_id);
                0
            }
        }
    }

    /// Drop channels nobody listens to any more
    pub fn prune(&self) -> usize {
        let before = self.channels.len();
        self.channels.retain(|_, sender| sender.receiver_count() > 0);
        before - self.channels.len()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typemate_types::RoomStatus;
    use uuid::Uuid;

    fn status_event(room_id: RoomId) -> RoomEvent {
        RoomEvent::StatusChanged {
            room_id,
            status: RoomStatus::Playing,
            started_at: None,
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_room_subscribers_only() {
        let feed = ChangeFeed::new();
        let room_a = Uuid::new_v4();
        let room_b = Uuid::new_v4();

        let mut alice = feed.subscribe(room_a);
        let mut bob = feed.subscribe(room_a);
        let mut carol = feed.subscribe(room_b);

        assert_eq!(feed.publish(status_event(room_a)), 2);

        assert_eq!(alice.recv().await.unwrap().room_id(), room_a);
        assert_eq!(bob.recv().await.unwrap().room_id(), room_a);
        assert!(carol.try_recv().is_err());
    }

    #[test]
    fn test_publish_without_subscribers() {
        let feed = ChangeFeed::new();
        assert_eq!(feed.publish(status_event(Uuid::new_v4())), 0);
        assert_eq!(feed.prune(), 0);
    }

    #[test]
    fn test_prune_drops_abandoned_rooms() {
        let feed = ChangeFeed::new();
        let room_a = Uuid::new_v4();
        let room_b = Uuid::new_v4();

        let receiver = feed.subscribe(room_a);
        let _kept = feed.subscribe(room_b);
        assert_eq!(feed.prune(), 0);

        drop(receiver);
        assert_eq!(feed.prune(), 1);
        assert_eq!(feed.prune(), 0);
        assert_eq!(feed.publish(status_event(room_a)), 0);
        assert_eq!(feed.publish(status_event(room_b)), 1);
    }
}
