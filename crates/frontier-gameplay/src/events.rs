//! Event bus for inter-system communication.

use crossbeam_channel::{bounded, Receiver, Sender};
use frontier_common::ObjectId;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcomes raised by the per-tick sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Score changed
    ScoreChanged {
        /// Amount added
        delta: i32,
    },
    /// Player touched an obstacle, hazard or enemy
    PlayerDied,
    /// Collectible picked up
    ObjectCollected {
        /// Object ID
        id: ObjectId,
    },
}

/// Event bus for broadcasting events to subscribers.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<GameEvent>,
    /// Receiver for collecting events
    receiver: Receiver<GameEvent>,
    /// Channel capacity
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event to the bus.
    ///
    /// Never blocks; returns `false` if the bus was full and the event was
    /// dropped.
    pub fn publish(&self, event: GameEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(_) => {
                debug!("Event bus full, dropped {event:?}");
                false
            },
        }
    }

    /// Publishes several events in order.
    pub fn publish_all(&self, events: &[GameEvent]) -> usize {
        events.iter().filter(|e| self.publish(**e)).count()
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<GameEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new sender handle for publishing events.
    #[must_use]
    pub fn sender(&self) -> Sender<GameEvent> {
        self.sender.clone()
    }
}
