//! # Mine Arena Game Server
//!
//! Authoritative simulation core for a networked arena game: circular rigid
//! bodies, fixed-timestep simulation, resource harvesting and snapshot
//! replication.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    MINE ARENA SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Numeric leaves                            │
//! │  ├── vec2.rs     - 2D float vector helpers                   │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - SHA-256 snapshot fingerprints             │
//! │                                                              │
//! │  physics/        - Circle-only rigid bodies                  │
//! │  ├── body.rs     - Movable and immovable circles             │
//! │  ├── collision.rs- Intersection, resolution, impulses        │
//! │  └── controller.rs- Body arena and per-step pass             │
//! │                                                              │
//! │  game/           - Gameplay on top of physics                │
//! │  ├── resources.rs- Saturating resource ledger                │
//! │  ├── events.rs   - Event enum and queue                      │
//! │  ├── systems.rs  - Pre/post-physics hooks, reactions         │
//! │  ├── state.rs    - Snapshots and their encodings             │
//! │  └── controller.rs- Fixed-timestep simulation root           │
//! │                                                              │
//! │  network/        - WebSocket server (tokio)                  │
//! │  ├── protocol.rs - Message types                             │
//! │  └── server.rs   - Connection and simulation tasks           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! Given the same configuration and the same input per tick, two controllers
//! produce bit-identical snapshots:
//! - Bodies and entities live in `BTreeMap`s, so pair and event order is fixed
//! - Time advances in whole-millisecond fixed steps, never wall-clock floats
//! - All spawn randomness comes from a seeded Xorshift128+

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod physics;
pub mod game;
pub mod network;
pub mod config;

// Re-export commonly used types
pub use crate::core::vec2::Vec2;
pub use crate::core::rng::DeterministicRng;
pub use physics::{CircleRigidBody, Collision, EntityId, Impulse, PhysicsController};
pub use game::{GameConfig, GameController, GameState, InputFrame, ResourceLedger, ResourceType};
pub use config::AppConfig;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default fixed simulation step (ms), about 60 Hz
pub const DEFAULT_TIME_STEP_MS: u32 = 16;
