//! Game State Snapshots
//!
//! Full, tick-stamped capture of every entity's replicated fields. The
//! authority builds one after each update; replicas overwrite their local
//! entities from it, keyed by id.
//!
//! ## Binary Layout
//!
//! bincode with its default options: fixed-width little-endian integers and
//! floats, `u64` length prefix before each list, `bool` as one byte.
//!
//! ```text
//! tick: u32
//! group_updates:  u64 len, then { group_id u32, is_active u8, x_pos f32, y_pos f32,
//!                                 radius f32, x_vel f32, y_vel f32, player_id u32 }
//! mine_updates:   u64 len, then { mine_id u32, is_active u8, x_pos f32, y_pos f32, radius f32 }
//! player_updates: u64 len, then { player_id u32, client_id u32, is_active u8, resources [u32; 4] }
//! ```

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::hash::{compute_state_hash, StateHash};
use crate::game::objects::ClientId;
use crate::game::resources::ResourceCounts;
use crate::physics::body::EntityId;

/// Replicated fields of a group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupUpdate {
    /// Group entity id
    pub group_id: EntityId,
    /// Body or slot in use
    pub is_active: bool,
    /// Center x
    pub x_pos: f32,
    /// Center y
    pub y_pos: f32,
    /// Body radius
    pub radius: f32,
    /// Velocity x
    pub x_vel: f32,
    /// Velocity y
    pub y_vel: f32,
    /// Owning player
    pub player_id: EntityId,
}

/// Replicated fields of a mine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MineUpdate {
    /// Mine entity id
    pub mine_id: EntityId,
    /// Body or slot in use
    pub is_active: bool,
    /// Center x
    pub x_pos: f32,
    /// Center y
    pub y_pos: f32,
    /// Body radius
    pub radius: f32,
}

/// Replicated fields of a player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerUpdate {
    /// Player entity id
    pub player_id: EntityId,
    /// Controlling client
    pub client_id: ClientId,
    /// Body or slot in use
    pub is_active: bool,
    /// Ledger balance per resource type
    pub resources: ResourceCounts,
}

/// Snapshot of the whole game at a tick boundary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Ticks simulated so far
    pub tick: u32,
    /// Groups in id order
    pub group_updates: Vec<GroupUpdate>,
    /// Mines in id order
    pub mine_updates: Vec<MineUpdate>,
    /// Players in id order
    pub player_updates: Vec<PlayerUpdate>,
}

/// Failure to decode or apply a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Binary payload is malformed
    #[error("invalid binary snapshot: {0}")]
    Decode(#[from] bincode::Error),

    /// JSON payload is malformed
    #[error("invalid JSON snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot is older than one already applied
    #[error("stale snapshot: tick {snapshot_tick} is older than applied tick {last_applied}")]
    Stale {
        snapshot_tick: u32,
        last_applied: u32,
    },
}

/// Result of applying a snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Records written to local entities
    pub applied: usize,
    /// Records ignored (unknown id, wrong kind or bad values)
    pub skipped: usize,
}

impl GameState {
    /// Total number of entity records.
    pub fn record_count(&self) -> usize {
        self.group_updates.len() + self.mine_updates.len() + self.player_updates.len()
    }

    /// Serialize to the binary wire layout.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from the binary wire layout.
    pub fn from_bytes(data: &[u8]) -> Result<Self, SnapshotError> {
        Ok(bincode::deserialize(data)?)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(s: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(s)?)
    }

    /// SHA-256 fingerprint of the snapshot.
    ///
    /// Floats are hashed by bit pattern, so two snapshots hash equal only if
    /// they are bit-identical.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, |h| {
            h.update_u32(self.group_updates.len() as u32);
            for g in &self.group_updates {
                h.update_u32(g.group_id);
                h.update_bool(g.is_active);
                h.update_f32(g.x_pos);
                h.update_f32(g.y_pos);
                h.update_f32(g.radius);
                h.update_f32(g.x_vel);
                h.update_f32(g.y_vel);
                h.update_u32(g.player_id);
            }

            h.update_u32(self.mine_updates.len() as u32);
            for m in &self.mine_updates {
                h.update_u32(m.mine_id);
                h.update_bool(m.is_active);
                h.update_f32(m.x_pos);
                h.update_f32(m.y_pos);
                h.update_f32(m.radius);
            }

            h.update_u32(self.player_updates.len() as u32);
            for p in &self.player_updates {
                h.update_u32(p.player_id);
                h.update_u32(p.client_id);
                h.update_bool(p.is_active);
                for count in p.resources {
                    h.update_u32(count);
                }
            }
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
