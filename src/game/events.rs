//! Game Events
//!
//! Closed set of events raised while the simulation runs, and the queue they
//! wait in until the controller flushes it at the end of a tick.

use std::collections::VecDeque;
use serde::{Serialize, Deserialize};

use crate::game::objects::ClientId;
use crate::physics::body::EntityId;
use crate::physics::collision::Collision;
use crate::physics::controller::CollisionListener;

/// Discriminant of [`Event`], for logging and counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventKind {
    /// Two bodies intersected during a physics step
    Collision = 0,
    /// A client was given a player
    ClientConnected = 1,
    /// A client's player was removed
    ClientDisconnected = 2,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Two bodies intersected and were separated.
    Collision(Collision),

    /// A client joined and now controls `player_id`.
    ClientConnected {
        client_id: ClientId,
        player_id: EntityId,
    },

    /// A client left; its player and group were retired.
    ClientDisconnected {
        client_id: ClientId,
        player_id: EntityId,
    },
}

impl Event {
    /// Kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Collision(_) => EventKind::Collision,
            Event::ClientConnected { .. } => EventKind::ClientConnected,
            Event::ClientDisconnected { .. } => EventKind::ClientDisconnected,
        }
    }
}

/// FIFO of events waiting to be dispatched.
///
/// Owned by the game controller and handed to whatever needs to publish.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: VecDeque<Event>,
    published: u64,
}

impl EventQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for the next flush.
    pub fn publish(&mut self, event: Event) {
        self.published += 1;
        self.pending.push_back(event);
    }

    /// Take the oldest pending event.
    pub fn pop(&mut self) -> Option<Event> {
        self.pending.pop_front()
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Nothing pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Events published over the queue's lifetime.
    pub fn published_count(&self) -> u64 {
        self.published
    }
}

impl CollisionListener for EventQueue {
    fn on_collision(&mut self, collision: Collision) {
        self.publish(Event::Collision(collision));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::Vec2;

    fn collision(a: EntityId, b: EntityId) -> Collision {
        Collision {
            ids: (a, b),
            position: Vec2::ZERO,
            normal: Vec2::RIGHT,
            resolution: (Vec2::ZERO, Vec2::ZERO),
        }
    }

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = EventQueue::new();
        queue.publish(Event::ClientConnected { client_id: 1, player_id: 10 });
        queue.on_collision(collision(10, 20));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().map(|e| e.kind()), Some(EventKind::ClientConnected));
        assert_eq!(queue.pop().map(|e| e.kind()), Some(EventKind::Collision));
        assert!(queue.pop().is_none());
        assert!(queue.is_empty());
        assert_eq!(queue.published_count(), 2);
    }

    #[test]
    fn test_collision_listener_wraps_event() {
        let mut queue = EventQueue::new();
        queue.on_collision(collision(3, 4));

        match queue.pop() {
            Some(Event::Collision(c)) => assert_eq!(c.ids, (3, 4)),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
