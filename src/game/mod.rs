//! Game Logic Module
//!
//! Everything that turns physics into a game: entities, inputs, resources,
//! events and the fixed-step controller that ties them together.
//!
//! ## Module Structure
//!
//! - `resources`: Saturating per-entity resource ledger
//! - `events`: Closed event enum and the per-tick event queue
//! - `input`: Client input frames
//! - `objects`: Player, group and mine records
//! - `store`: Entity arena keyed by id
//! - `systems`: Pre/post-physics hooks and collision reactions
//! - `state`: Snapshot types and their encodings
//! - `controller`: Fixed-timestep simulation root

pub mod resources;
pub mod events;
pub mod input;
pub mod objects;
pub mod store;
pub mod systems;
pub mod state;
pub mod controller;

// Re-export key types
pub use resources::{ResourceLedger, ResourceType, ResourceCounts, RESOURCE_TYPE_COUNT};
pub use events::{Event, EventKind, EventQueue};
pub use input::{ClientInputs, InputFrame};
pub use objects::{ClientId, EntityKind, Group, Mine, Player};
pub use store::GameObjectStore;
pub use state::{ApplyReport, GameState, GroupUpdate, MineUpdate, PlayerUpdate, SnapshotError};
pub use controller::{GameConfig, GameController, GameError, TickResult, UpdateResult};
