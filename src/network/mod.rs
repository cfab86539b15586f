//! Network Layer
//!
//! WebSocket server for real-time multiplayer communication.
//! Nothing here runs inside a tick; the simulation task hands finished
//! snapshots to connections.

pub mod protocol;
pub mod server;

pub use protocol::{ClientMessage, ServerMessage, GameInput, WelcomeInfo, ErrorCode};
pub use server::{GameServer, ServerConfig, GameServerError};
