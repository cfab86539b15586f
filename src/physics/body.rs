//! Circular Rigid Bodies
//!
//! Point-mass circles. A body with infinite mass is immovable: it never
//! integrates, never takes a resolution displacement and ignores impulses.

use crate::core::vec2::Vec2;
use crate::physics::collision::Impulse;

/// Stable entity identifier shared by physics, gameplay and the network layer.
pub type EntityId = u32;

/// A circle participating in collision physics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CircleRigidBody {
    /// Owning entity id (unique for the entity lifetime)
    pub id: EntityId,
    /// Center position
    pub center: Vec2,
    /// Radius (> 0)
    pub radius: f32,
    /// Linear velocity (units per second)
    pub velocity: Vec2,
    /// Mass; `f32::INFINITY` marks an immovable body
    pub mass: f32,
    /// Inactive bodies neither move nor collide
    pub active: bool,
    /// Force accumulated since the last integration
    force: Vec2,
}

impl CircleRigidBody {
    /// Create a movable body at rest.
    pub fn new(id: EntityId, center: Vec2, radius: f32, mass: f32) -> Self {
        debug_assert!(radius > 0.0, "body {} has non-positive radius {}", id, radius);
        debug_assert!(mass > 0.0, "body {} has non-positive mass {}", id, mass);
        Self {
            id,
            center,
            radius,
            velocity: Vec2::ZERO,
            mass,
            active: true,
            force: Vec2::ZERO,
        }
    }

    /// Create an immovable (infinite mass) body.
    pub fn immovable(id: EntityId, center: Vec2, radius: f32) -> Self {
        Self::new(id, center, radius, f32::INFINITY)
    }

    /// Whether the body responds to resolution, impulses and forces.
    #[inline]
    pub fn is_movable(&self) -> bool {
        self.mass.is_finite()
    }

    /// `1 / mass`, which is exactly zero for immovable bodies.
    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        if self.is_movable() {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// Force waiting for the next integration.
    #[inline]
    pub fn pending_force(&self) -> Vec2 {
        self.force
    }

    /// Accumulate a force to be integrated on the next physics step.
    pub fn apply_force(&mut self, force: Vec2) {
        if self.is_movable() {
            self.force += force;
        }
    }

    /// Apply an instantaneous velocity change.
    pub fn apply_impulse(&mut self, impulse: Impulse) {
        self.velocity += impulse.direction * (impulse.magnitude * self.inverse_mass());
    }

    /// Displace the center (collision resolution).
    #[inline]
    pub fn translate(&mut self, offset: Vec2) {
        self.center += offset;
    }

    /// Semi-implicit Euler step followed by velocity damping.
    pub fn integrate(&mut self, dt: f32, damping: f32) {
        if !self.is_movable() {
            self.force = Vec2::ZERO;
            return;
        }

        self.velocity += self.force * (dt * self.inverse_mass());
        self.center += self.velocity * dt;
        self.velocity = self.velocity * damping;
        self.force = Vec2::ZERO;
    }
}
