//! Core numeric primitives.
//!
//! Geometry, seeded randomness and state fingerprints shared by the physics
//! and game layers.

pub mod vec2;
pub mod rng;
pub mod hash;

// Re-export core types
pub use vec2::Vec2;
pub use rng::DeterministicRng;
pub use hash::{StateHash, StateHasher, compute_state_hash};
