//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Control messages are JSON text frames. Snapshots can additionally go out
//! as binary frames holding the bincode [`GameState`] layout, and clients may
//! send a bare bincode [`GameInput`] as a binary frame.

use serde::{Serialize, Deserialize};

use crate::game::input::InputFrame;
use crate::game::objects::ClientId;
use crate::game::state::GameState;
use crate::physics::body::EntityId;

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Latest stick position.
    Input(GameInput),

    /// Ping for latency measurement.
    Ping { timestamp: u64 },

    /// Player is leaving the game.
    Leave,
}

/// Player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInput {
    /// Movement X direction (-127 to 127, -128 = released).
    pub move_x: i8,
    /// Movement Y direction (-127 to 127, -128 = released).
    pub move_y: i8,
}

impl GameInput {
    /// Convert to InputFrame for game simulation.
    pub fn to_input_frame(&self) -> InputFrame {
        InputFrame::with_movement(self.move_x, self.move_y)
    }

    /// Serialize to binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Join accepted.
    Welcome(WelcomeInfo),

    /// Snapshot after a simulation update.
    State(GameState),

    /// Pong response.
    Pong { timestamp: u64, server_time: u64 },

    /// Error message.
    Error(ServerError),

    /// Server is shutting down.
    Shutdown { reason: String },
}

/// Sent once after a client has been given a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelcomeInfo {
    /// Id assigned to this connection.
    pub client_id: ClientId,
    /// Player the client controls.
    pub player_id: EntityId,
    /// Server tick at join time.
    pub tick: u32,
    /// Fixed step length, for client-side interpolation.
    pub time_step_ms: u32,
    /// Server version string.
    pub server_version: String,
}

/// Server error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Message could not be parsed.
    InvalidInput,
    /// No free player slot.
    ArenaFull,
    /// Connection limit reached.
    ServerOverloaded,
    /// Internal error.
    InternalError,
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
