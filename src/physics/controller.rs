//! Physics Controller
//!
//! Owns every rigid body, keyed by entity id, and advances them one fixed
//! step at a time: integrate motion, then scan pairs, separate the overlapping
//! ones, exchange impulses and publish each collision.
//!
//! Bodies live in a `BTreeMap` so the pair scan always visits pairs in the
//! same order. The scan is O(n²) over active bodies.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

#[cfg(feature = "debug-tracing")]
use tracing::trace;

use crate::physics::body::{CircleRigidBody, EntityId};
use crate::physics::collision::{are_intersecting, get_collision, get_impulses, Collision};

/// Receiver for collisions found during a physics step.
///
/// This is the only channel from physics to gameplay.
pub trait CollisionListener {
    /// Called once per intersecting pair, after resolution and impulses.
    fn on_collision(&mut self, collision: Collision);
}

impl CollisionListener for Vec<Collision> {
    fn on_collision(&mut self, collision: Collision) {
        self.push(collision);
    }
}

/// Configuration for the physics step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Velocity multiplier applied after every integration (1.0 = no damping)
    pub velocity_damping: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            velocity_damping: 0.9,
        }
    }
}

/// Rigid body arena and step driver.
#[derive(Debug, Default)]
pub struct PhysicsController {
    config: PhysicsConfig,
    bodies: BTreeMap<EntityId, CircleRigidBody>,
}

impl PhysicsController {
    /// Create an empty controller.
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            bodies: BTreeMap::new(),
        }
    }

    /// Insert a body, replacing any body with the same id.
    pub fn insert(&mut self, body: CircleRigidBody) -> Option<CircleRigidBody> {
        self.bodies.insert(body.id, body)
    }

    /// Remove a body.
    pub fn remove(&mut self, id: EntityId) -> Option<CircleRigidBody> {
        self.bodies.remove(&id)
    }

    /// Get a body by id.
    pub fn get(&self, id: EntityId) -> Option<&CircleRigidBody> {
        self.bodies.get(&id)
    }

    /// Get a mutable body by id.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut CircleRigidBody> {
        self.bodies.get_mut(&id)
    }

    /// Iterate bodies in id order.
    pub fn bodies(&self) -> impl Iterator<Item = &CircleRigidBody> {
        self.bodies.values()
    }

    /// Number of bodies.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// No bodies at all.
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Advance all bodies by `delta_ms` and resolve collisions.
    ///
    /// Returns the number of collisions published to `listener`.
    pub fn update<L: CollisionListener>(&mut self, delta_ms: u32, listener: &mut L) -> usize {
        let dt = delta_ms as f32 / 1000.0;
        self.integrate(dt);
        self.resolve_collisions(listener)
    }

    fn integrate(&mut self, dt: f32) {
        let damping = self.config.velocity_damping;
        for body in self.bodies.values_mut() {
            if body.active {
                body.integrate(dt, damping);
            }
        }
    }

    fn resolve_collisions<L: CollisionListener>(&mut self, listener: &mut L) -> usize {
        let ids: Vec<EntityId> = self
            .bodies
            .values()
            .filter(|body| body.active)
            .map(|body| body.id)
            .collect();

        let mut count = 0;

        // Check all pairs (i, j) where i < j
        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                // Copies: earlier pairs in this pass may have moved either body
                let (a, b) = match (self.bodies.get(&ids[i]), self.bodies.get(&ids[j])) {
                    (Some(a), Some(b)) => (*a, *b),
                    _ => continue,
                };

                if !are_intersecting(&a, &b) {
                    continue;
                }

                let collision = get_collision(&a, &b);

                if let Some(body) = self.bodies.get_mut(&a.id) {
                    body.translate(collision.resolution.0);
                }
                if let Some(body) = self.bodies.get_mut(&b.id) {
                    body.translate(collision.resolution.1);
                }

                if a.is_movable() || b.is_movable() {
                    let (impulse_a, impulse_b) = get_impulses(&a, &b, &collision);
                    if let Some(body) = self.bodies.get_mut(&a.id) {
                        body.apply_impulse(impulse_a);
                    }
                    if let Some(body) = self.bodies.get_mut(&b.id) {
                        body.apply_impulse(impulse_b);
                    }
                }

                #[cfg(feature = "debug-tracing")]
                trace!(?collision, "collision resolved");

                listener.on_collision(collision);
                count += 1;
            }
        }

        count
    }
}
