//! Game Objects
//!
//! Gameplay records for the three entity kinds. Position, velocity, radius
//! and the active flag of groups and mines live in their physics body; these
//! records only hold what physics does not know about.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::physics::body::EntityId;

/// Network-assigned client identifier.
pub type ClientId = u32;

/// Kind of an entity id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EntityKind {
    /// Movable circle steered by a player
    Group = 0,
    /// Immovable circle holding a resource stock
    Mine = 1,
    /// Non-physical owner of a group and a resource balance
    Player = 2,
}

/// A participant slot, bound to a client while one is connected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Entity id
    pub id: EntityId,
    /// Controlling client (0 while unassigned)
    pub client_id: ClientId,
    /// Slot in use
    pub active: bool,
    /// Input direction for the current frame, length <= 1
    pub direction: Vec2,
    /// The group this player steers
    pub group_id: EntityId,
}

impl Player {
    /// Create an unassigned player slot.
    pub fn new(id: EntityId, group_id: EntityId) -> Self {
        Self {
            id,
            client_id: 0,
            active: false,
            direction: Vec2::ZERO,
            group_id,
        }
    }
}

/// A steerable body owned by a player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Entity id (also the physics body id)
    pub id: EntityId,
    /// Owning player
    pub player_id: EntityId,
}

/// A harvestable, immovable body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mine {
    /// Entity id (also the physics body id)
    pub id: EntityId,
}
