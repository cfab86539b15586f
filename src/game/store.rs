//! Game Object Store
//!
//! Arena of gameplay records keyed by entity id. Ids come from a single
//! counter starting at 1, so an authority and a replica that load the same
//! level end up with the same ids for the same slots.

use std::collections::BTreeMap;

use crate::game::objects::{ClientId, EntityKind, Group, Mine, Player};
use crate::physics::body::EntityId;

/// Entity records for every kind, plus id allocation.
#[derive(Clone, Debug)]
pub struct GameObjectStore {
    next_id: EntityId,
    players: BTreeMap<EntityId, Player>,
    groups: BTreeMap<EntityId, Group>,
    mines: BTreeMap<EntityId, Mine>,
}

impl Default for GameObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GameObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            players: BTreeMap::new(),
            groups: BTreeMap::new(),
            mines: BTreeMap::new(),
        }
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add an unassigned player together with its group.
    ///
    /// Returns `(player_id, group_id)`.
    pub fn add_player_slot(&mut self) -> (EntityId, EntityId) {
        let player_id = self.allocate_id();
        let group_id = self.allocate_id();
        self.players.insert(player_id, Player::new(player_id, group_id));
        self.groups.insert(group_id, Group { id: group_id, player_id });
        (player_id, group_id)
    }

    /// Add a mine record.
    pub fn add_mine_slot(&mut self) -> EntityId {
        let id = self.allocate_id();
        self.mines.insert(id, Mine { id });
        id
    }

    /// First player slot not bound to a client.
    pub fn free_player_slot(&self) -> Option<EntityId> {
        self.players.values().find(|p| !p.active).map(|p| p.id)
    }

    /// Kind of an entity, if it exists.
    pub fn kind_of(&self, id: EntityId) -> Option<EntityKind> {
        if self.groups.contains_key(&id) {
            Some(EntityKind::Group)
        } else if self.mines.contains_key(&id) {
            Some(EntityKind::Mine)
        } else if self.players.contains_key(&id) {
            Some(EntityKind::Player)
        } else {
            None
        }
    }

    /// Active player bound to a client.
    pub fn player_for_client(&self, client_id: ClientId) -> Option<&Player> {
        self.players
            .values()
            .find(|p| p.active && p.client_id == client_id)
    }

    /// Get a player.
    pub fn player(&self, id: EntityId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Get a mutable player.
    pub fn player_mut(&mut self, id: EntityId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// Get a group.
    pub fn group(&self, id: EntityId) -> Option<&Group> {
        self.groups.get(&id)
    }

    /// Get a mine.
    pub fn mine(&self, id: EntityId) -> Option<&Mine> {
        self.mines.get(&id)
    }

    /// Players in id order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Mutable players in id order.
    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut()
    }

    /// Groups in id order.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Mines in id order.
    pub fn mines(&self) -> impl Iterator<Item = &Mine> {
        self.mines.values()
    }

    /// Player count (active or not).
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Mine count (active or not).
    pub fn mine_count(&self) -> usize {
        self.mines.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================
