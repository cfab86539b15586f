//! Physics Module
//!
//! Circle-only rigid body physics.
//!
//! ## Module Structure
//!
//! - `body`: Circular rigid bodies (movable or immovable)
//! - `collision`: Intersection, resolution and impulse math
//! - `controller`: Body arena and the per-step integrate/resolve pass

pub mod body;
pub mod collision;
pub mod controller;

// Re-export key types
pub use body::{CircleRigidBody, EntityId};
pub use collision::{Collision, Impulse, are_intersecting, get_collision, get_impulses};
pub use controller::{CollisionListener, PhysicsConfig, PhysicsController};
