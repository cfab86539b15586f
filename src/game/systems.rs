//! Gameplay Systems
//!
//! Free functions run by the game controller around each physics step.
//! Pre-physics: inputs become player directions, directions become forces
//! on groups. Post-physics: groups are kept inside the arena, exhausted mines
//! retire, group bodies follow their player's active flag. Collision
//! reactions run while the event queue is flushed.

use tracing::debug;

use crate::core::vec2::Vec2;
use crate::game::input::ClientInputs;
use crate::game::objects::EntityKind;
use crate::game::resources::{ResourceLedger, ResourceType};
use crate::game::store::GameObjectStore;
use crate::physics::collision::Collision;
use crate::physics::controller::PhysicsController;
use crate::physics::body::EntityId;

/// Knockback factor along the normal for a group on the first side of a pair.
pub const KNOCKBACK_FIRST: f32 = -30.0;

/// Knockback factor along the normal for a group on the second side of a pair.
pub const KNOCKBACK_SECOND: f32 = 10.0;

/// Tunables used by the collision reactions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReactionTuning {
    /// Multiplier on the knockback factors
    pub knockback_scale: f32,
    /// Units of each resource taken from a mine per contact
    pub harvest_amount: u32,
}

/// What a single collision did to the game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollisionOutcome {
    /// Groups that received knockback
    pub knocked_back: u8,
    /// Resource units moved from a mine to a player
    pub harvested: u32,
}

// =============================================================================
// PRE-PHYSICS
// =============================================================================

/// Copy each connected client's input onto its player.
///
/// Players without input this frame stop steering.
pub fn apply_player_inputs(store: &mut GameObjectStore, inputs: &ClientInputs) {
    for player in store.players_mut() {
        player.direction = if player.active {
            inputs
                .get(&player.client_id)
                .map(|frame| frame.move_direction())
                .unwrap_or(Vec2::ZERO)
        } else {
            Vec2::ZERO
        };
    }
}

/// Push each active group along its player's direction.
pub fn drive_groups(store: &GameObjectStore, physics: &mut PhysicsController, move_force: f32) {
    for group in store.groups() {
        let direction = match store.player(group.player_id) {
            Some(player) if player.active => player.direction,
            _ => continue,
        };

        if let Some(body) = physics.get_mut(group.id) {
            if body.active {
                body.apply_force(direction * move_force);
            }
        }
    }
}

// =============================================================================
// POST-PHYSICS
// =============================================================================

/// Keep groups fully inside the arena.
///
/// Velocity pointing out of a wall the group touches is dropped.
pub fn clamp_groups_to_arena(
    store: &GameObjectStore,
    physics: &mut PhysicsController,
    half_extents: Vec2,
) {
    for group in store.groups() {
        let Some(body) = physics.get_mut(group.id) else {
            continue;
        };
        if !body.active {
            continue;
        }

        let r = Vec2::new(body.radius, body.radius);
        let min = -half_extents + r;
        let max = half_extents - r;
        let clamped = body.center.clamp(min, max);

        if clamped.x != body.center.x {
            body.velocity.x = 0.0;
        }
        if clamped.y != body.center.y {
            body.velocity.y = 0.0;
        }
        body.center = clamped;
    }
}

/// Deactivate active mines that hold nothing.
///
/// Returns the ids of the mines retired this call.
pub fn retire_depleted_mines(
    store: &GameObjectStore,
    physics: &mut PhysicsController,
    ledger: &ResourceLedger,
) -> Vec<EntityId> {
    let mut retired = Vec::new();

    for mine in store.mines() {
        if let Some(body) = physics.get_mut(mine.id) {
            if body.active && ledger.is_empty_for(mine.id) {
                body.active = false;
                retired.push(mine.id);
            }
        }
    }

    retired
}

/// Make each group body's active flag match its player.
pub fn sync_group_activity(store: &GameObjectStore, physics: &mut PhysicsController) {
    for group in store.groups() {
        let active = store.player(group.player_id).is_some_and(|p| p.active);
        if let Some(body) = physics.get_mut(group.id) {
            body.active = active;
        }
    }
}

// =============================================================================
// COLLISION REACTIONS
// =============================================================================

/// Gameplay response to one collision.
///
/// Groups are knocked back along the contact normal, with the first side
/// of the pair taking the larger push toward the second. A group touching a
/// mine harvests from it into the owning player's balance.
pub fn react_to_collision(
    collision: &Collision,
    store: &GameObjectStore,
    physics: &mut PhysicsController,
    ledger: &mut ResourceLedger,
    tuning: ReactionTuning,
) -> CollisionOutcome {
    let (first, second) = collision.ids;
    let (kind_first, kind_second) = match (store.kind_of(first), store.kind_of(second)) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            debug!(first, second, "collision with unknown entity skipped");
            return CollisionOutcome::default();
        }
    };

    let mut outcome = CollisionOutcome::default();

    if kind_first == EntityKind::Group {
        if let Some(body) = physics.get_mut(first) {
            body.apply_force(collision.normal * (KNOCKBACK_FIRST * tuning.knockback_scale));
            outcome.knocked_back += 1;
        }
    }
    if kind_second == EntityKind::Group {
        if let Some(body) = physics.get_mut(second) {
            body.apply_force(collision.normal * (KNOCKBACK_SECOND * tuning.knockback_scale));
            outcome.knocked_back += 1;
        }
    }

    let harvest = match (kind_first, kind_second) {
        (EntityKind::Group, EntityKind::Mine) => Some((first, second)),
        (EntityKind::Mine, EntityKind::Group) => Some((second, first)),
        _ => None,
    };

    if let Some((group_id, mine_id)) = harvest {
        if let Some(group) = store.group(group_id) {
            for resource in ResourceType::ALL {
                let moved = ledger.transfer(mine_id, group.player_id, resource, tuning.harvest_amount);
                outcome.harvested = outcome.harvested.saturating_add(moved.added);
            }
        }
    }

    outcome
}

// =============================================================================
// TESTS
// =============================================================================
