//! Client Input
//!
//! Input frames as sent by clients and collected once per frame by the
//! game controller. Axis values are signed bytes so a frame stays tiny on
//! the wire and converts to the same direction on every machine.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::objects::ClientId;

/// Inputs collected for one frame, keyed by client.
///
/// A `BTreeMap` so players are driven in client id order.
pub type ClientInputs = BTreeMap<ClientId, InputFrame>;

/// Convert a signed axis byte to `[-1, 1]`.
///
/// `-128` is reserved for "stick released" and maps to `0`.
#[inline]
pub fn axis_to_f32(value: i8) -> f32 {
    if value == InputFrame::NO_INPUT {
        0.0
    } else {
        value as f32 / 127.0
    }
}

/// Raw input state for a single frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Movement X direction: -127 (left) to +127 (right)
    /// -128 = joystick released / no input
    pub move_x: i8,

    /// Movement Y direction: -127 (down) to +127 (up)
    /// -128 = joystick released / no input
    pub move_y: i8,
}

impl Default for InputFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl InputFrame {
    /// Special value indicating no input (joystick released)
    pub const NO_INPUT: i8 = -128;

    /// Create an idle input frame.
    pub const fn new() -> Self {
        Self {
            move_x: Self::NO_INPUT,
            move_y: Self::NO_INPUT,
        }
    }

    /// Create input with movement direction.
    pub const fn with_movement(move_x: i8, move_y: i8) -> Self {
        Self { move_x, move_y }
    }

    /// Movement direction, never longer than 1.
    ///
    /// Diagonals are normalized so they are not faster than straight moves.
    pub fn move_direction(&self) -> Vec2 {
        let dir = Vec2::new(axis_to_f32(self.move_x), axis_to_f32(self.move_y));
        if dir.length_squared() > 1.0 {
            dir.normalize()
        } else {
            dir
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    #[test]
    fn test_axis_conversion() {
        assert_eq!(axis_to_f32(0), 0.0);
        assert_eq!(axis_to_f32(127), 1.0);
        assert_eq!(axis_to_f32(-127), -1.0);
        assert_eq!(axis_to_f32(InputFrame::NO_INPUT), 0.0);

        for v in 1..=127i8 {
            assert_eq!(axis_to_f32(v), -axis_to_f32(-v), "axis should be symmetric for {}", v);
        }
    }

    #[test]
    fn test_idle_frame() {
        let frame = InputFrame::default();
        assert_eq!(frame, InputFrame::with_movement(InputFrame::NO_INPUT, InputFrame::NO_INPUT));
        assert_eq!(frame.move_direction(), Vec2::ZERO);
    }

    #[test]
    fn test_straight_movement() {
        let dir = InputFrame::with_movement(127, 0).move_direction();
        assert!((dir.x - 1.0).abs() < EPS);
        assert_eq!(dir.y, 0.0);
    }

    #[test]
    fn test_diagonal_is_normalized() {
        let dir = InputFrame::with_movement(127, -127).move_direction();
        assert!((dir.length() - 1.0).abs() < EPS);
        assert!(dir.x > 0.0 && dir.y < 0.0);
    }

    #[test]
    fn test_partial_tilt_is_kept() {
        let dir = InputFrame::with_movement(64, 0).move_direction();
        assert!((dir.x - 64.0 / 127.0).abs() < EPS);
    }
}
