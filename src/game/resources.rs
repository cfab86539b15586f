//! Resource Ledger
//!
//! Per-entity table of unsigned resource counters. Arithmetic saturates at
//! `0` and `u32::MAX`; callers learn how much of a request was honored from
//! the returned deltas, never from an error.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::physics::body::EntityId;

/// Number of resource types tracked per entity.
pub const RESOURCE_TYPE_COUNT: usize = 4;

/// Counters for one entity, indexed by [`ResourceType::index`].
pub type ResourceCounts = [u32; RESOURCE_TYPE_COUNT];

/// Kind of resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ResourceType {
    Ore = 0,
    Fuel = 1,
    Ammo = 2,
    Score = 3,
}

impl ResourceType {
    /// All resource types in index order.
    pub const ALL: [ResourceType; RESOURCE_TYPE_COUNT] = [
        ResourceType::Ore,
        ResourceType::Fuel,
        ResourceType::Ammo,
        ResourceType::Score,
    ];

    /// Slot in [`ResourceCounts`].
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Get from index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Outcome of a single saturating add or subtract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Applied {
    /// Amount actually added or removed
    pub delta: u32,
    /// Balance afterwards
    pub total: u32,
}

/// Outcome of moving resource between two entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer {
    /// Amount removed from the sender
    pub subtracted: u32,
    /// Sender balance afterwards
    pub sender_total: u32,
    /// Amount credited to the receiver (never more than `subtracted`)
    pub added: u32,
    /// Receiver balance afterwards
    pub receiver_total: u32,
}

/// Saturating resource counters keyed by entity id.
#[derive(Clone, Debug, Default)]
pub struct ResourceLedger {
    counts: BTreeMap<EntityId, ResourceCounts>,
}

impl ResourceLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, id: EntityId) -> &mut ResourceCounts {
        self.counts.entry(id).or_insert([0; RESOURCE_TYPE_COUNT])
    }

    /// Give an entity a fresh all-zero record, dropping any old balance.
    pub fn init(&mut self, id: EntityId) {
        self.counts.insert(id, [0; RESOURCE_TYPE_COUNT]);
    }

    /// All counters of an entity, zero-initializing on first access.
    pub fn get(&mut self, id: EntityId) -> ResourceCounts {
        *self.entry(id)
    }

    /// One counter of an entity, zero-initializing on first access.
    pub fn count(&mut self, id: EntityId, resource: ResourceType) -> u32 {
        self.entry(id)[resource.index()]
    }

    /// Read counters without creating a record.
    pub fn peek(&self, id: EntityId) -> Option<&ResourceCounts> {
        self.counts.get(&id)
    }

    /// Overwrite a counter.
    pub fn set(&mut self, id: EntityId, resource: ResourceType, count: u32) {
        self.entry(id)[resource.index()] = count;
    }

    /// Add up to `count`, stopping at `u32::MAX`.
    pub fn add(&mut self, id: EntityId, resource: ResourceType, count: u32) -> Applied {
        let slot = &mut self.entry(id)[resource.index()];
        let delta = count.min(u32::MAX - *slot);
        *slot += delta;
        Applied { delta, total: *slot }
    }

    /// Remove up to `count`, stopping at zero.
    pub fn subtract(&mut self, id: EntityId, resource: ResourceType, count: u32) -> Applied {
        let slot = &mut self.entry(id)[resource.index()];
        let delta = count.min(*slot);
        *slot -= delta;
        Applied { delta, total: *slot }
    }

    /// Move up to `count` from `from` to `to`.
    ///
    /// The receiver is credited with what was actually taken from the sender,
    /// so a transfer never creates resource. If the receiver saturates, the
    /// excess is lost.
    pub fn transfer(
        &mut self,
        from: EntityId,
        to: EntityId,
        resource: ResourceType,
        count: u32,
    ) -> Transfer {
        let taken = self.subtract(from, resource, count);
        let given = self.add(to, resource, taken.delta);
        Transfer {
            subtracted: taken.delta,
            sender_total: taken.total,
            added: given.delta,
            receiver_total: given.total,
        }
    }

    /// Drop an entity's record.
    pub fn remove(&mut self, id: EntityId) -> Option<ResourceCounts> {
        self.counts.remove(&id)
    }

    /// Whether the entity holds nothing at all (or has no record).
    pub fn is_empty_for(&self, id: EntityId) -> bool {
        self.peek(id).is_none_or(|counts| counts.iter().all(|c| *c == 0))
    }

    /// Sum of one resource across every entity.
    pub fn total(&self, resource: ResourceType) -> u64 {
        self.counts
            .values()
            .map(|counts| counts[resource.index()] as u64)
            .sum()
    }
}
