//! Circle Collision Math
//!
//! Pure functions over pairs of [`CircleRigidBody`]: the intersection test,
//! the positional resolution of an overlapping pair and the impulse exchange.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::physics::body::{CircleRigidBody, EntityId};

/// Normal used when two centers coincide exactly.
pub const COINCIDENT_NORMAL: Vec2 = Vec2::RIGHT;

/// One intersecting pair, as computed before resolution was applied.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collision {
    /// Colliding entity ids (first, second)
    pub ids: (EntityId, EntityId),
    /// Contact point: midpoint of the resolved centers
    pub position: Vec2,
    /// Unit vector from the second body's center toward the first's
    pub normal: Vec2,
    /// Displacements for (first, second) that remove the overlap
    pub resolution: (Vec2, Vec2),
}

/// Velocity change for one body of a colliding pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Impulse {
    /// Signed impulse magnitude
    pub magnitude: f32,
    /// Direction the impulse is applied along
    pub direction: Vec2,
}

/// Check whether two distinct circles overlap.
///
/// A body never intersects itself; touching circles do not intersect.
#[inline]
pub fn are_intersecting(a: &CircleRigidBody, b: &CircleRigidBody) -> bool {
    if a.id == b.id {
        return false;
    }
    a.center.distance(b.center) < a.radius + b.radius
}

/// Compute how an overlapping pair should be separated.
///
/// The overlap is split along the normal depending on which bodies can move:
///
/// | A movable | B movable | A displacement       | B displacement        |
/// |-----------|-----------|----------------------|-----------------------|
/// | yes       | yes       | `+normal * overlap/2`| `-normal * overlap/2` |
/// | yes       | no        | `+normal * overlap`  | zero                  |
/// | no        | yes       | zero                 | `-normal * overlap/2` |
/// | no        | no        | zero                 | zero                  |
///
/// The third row moves B by half the overlap only. That is the established
/// behavior of the game and clients depend on it.
pub fn get_collision(a: &CircleRigidBody, b: &CircleRigidBody) -> Collision {
    let distance = a.center.distance(b.center);
    let overlap = a.radius + b.radius - distance;

    let normal = if distance == 0.0 {
        COINCIDENT_NORMAL
    } else {
        b.center.direction_to(a.center).normalize()
    };

    let resolution = match (a.is_movable(), b.is_movable()) {
        (true, true) => (normal * (overlap / 2.0), -normal * (overlap / 2.0)),
        (true, false) => (normal * overlap, Vec2::ZERO),
        (false, true) => (Vec2::ZERO, -normal * (overlap / 2.0)),
        (false, false) => (Vec2::ZERO, Vec2::ZERO),
    };

    let position = (a.center + resolution.0).midpoint(b.center + resolution.1);

    Collision {
        ids: (a.id, b.id),
        position,
        normal,
        resolution,
    }
}

/// Compute the elastic impulse pair for a collision.
///
/// `magnitude = -2 * dot(vA - vB, normal) / (1/mA + 1/mB)`, applied along
/// `+normal` to A and `-normal` to B.
///
/// At least one body must be movable. With two immovable bodies the
/// denominator is zero; debug builds panic and release builds return a zero
/// magnitude.
pub fn get_impulses(
    a: &CircleRigidBody,
    b: &CircleRigidBody,
    collision: &Collision,
) -> (Impulse, Impulse) {
    let inverse_mass_sum = a.inverse_mass() + b.inverse_mass();
    debug_assert!(
        inverse_mass_sum > 0.0,
        "impulse requested for immovable pair ({}, {})",
        a.id,
        b.id
    );

    let relative_velocity = a.velocity - b.velocity;
    let magnitude = if inverse_mass_sum > 0.0 {
        -2.0 * relative_velocity.dot(collision.normal) / inverse_mass_sum
    } else {
        0.0
    };

    (
        Impulse { magnitude, direction: collision.normal },
        Impulse { magnitude, direction: -collision.normal },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn circle(id: EntityId, x: f32, y: f32, radius: f32) -> CircleRigidBody {
        CircleRigidBody::new(id, Vec2::new(x, y), radius, 1.0)
    }

    fn wall(id: EntityId, x: f32, y: f32, radius: f32) -> CircleRigidBody {
        CircleRigidBody::immovable(id, Vec2::new(x, y), radius)
    }

    #[test]
    fn test_intersection_strict_inequality() {
        let a = circle(1, 0.0, 0.0, 1.0);

        assert!(are_intersecting(&a, &circle(2, 1.5, 0.0, 1.0)));
        // Exactly touching is not intersecting
        assert!(!are_intersecting(&a, &circle(2, 2.0, 0.0, 1.0)));
        assert!(!are_intersecting(&a, &circle(2, 3.0, 0.0, 1.0)));
    }

    #[test]
    fn test_same_id_never_intersects() {
        let a = circle(7, 0.0, 0.0, 1.0);
        let twin = circle(7, 0.1, 0.0, 1.0);
        assert!(!are_intersecting(&a, &twin));
    }

    #[test]
    fn test_equal_movable_pair_splits_overlap() {
        let a = circle(1, 0.0, 0.0, 1.0);
        let b = circle(2, 1.5, 0.0, 1.0);
        let collision = get_collision(&a, &b);

        // Normal points from B toward A
        assert!((collision.normal.x + 1.0).abs() < EPS);
        assert!((collision.resolution.0.x + 0.25).abs() < EPS);
        assert!((collision.resolution.1.x - 0.25).abs() < EPS);

        let a_after = a.center + collision.resolution.0;
        let b_after = b.center + collision.resolution.1;
        assert!((a_after.distance(b_after) - 2.0).abs() < EPS);
        assert!((collision.position.x - 0.75).abs() < EPS);
        assert_eq!(collision.ids, (1, 2));
    }

    #[test]
    fn test_movable_against_wall_takes_full_correction() {
        let a = circle(1, 0.0, 0.0, 1.0);
        let b = wall(2, 1.6, 0.0, 1.0);
        let collision = get_collision(&a, &b);

        assert!((collision.resolution.0.length() - 0.4).abs() < EPS);
        assert_eq!(collision.resolution.1, Vec2::ZERO);
    }

    #[test]
    fn test_wall_against_movable_moves_second_by_half() {
        let a = wall(1, 0.0, 0.0, 1.0);
        let b = circle(2, 1.6, 0.0, 1.0);
        let collision = get_collision(&a, &b);

        assert_eq!(collision.resolution.0, Vec2::ZERO);
        assert!((collision.resolution.1.x - 0.2).abs() < EPS);
    }

    #[test]
    fn test_two_walls_are_recorded_but_not_corrected() {
        let collision = get_collision(&wall(1, 0.0, 0.0, 1.0), &wall(2, 1.0, 0.0, 1.0));
        assert_eq!(collision.resolution, (Vec2::ZERO, Vec2::ZERO));
        assert!((collision.position.x - 0.5).abs() < EPS);
    }

    #[test]
    fn test_coincident_centers_use_fixed_normal() {
        let a = circle(1, 2.0, 2.0, 1.0);
        let b = circle(2, 2.0, 2.0, 1.0);
        let collision = get_collision(&a, &b);

        assert_eq!(collision.normal, COINCIDENT_NORMAL);
        assert!(collision.resolution.0.is_finite());
        assert!((collision.resolution.0.x - 1.0).abs() < EPS);
        assert!((collision.resolution.1.x + 1.0).abs() < EPS);
    }

    #[test]
    fn test_head_on_impulses_swap_equal_mass_velocities() {
        let mut a = circle(1, 0.0, 0.0, 1.0);
        let mut b = circle(2, 1.5, 0.0, 1.0);
        a.velocity = Vec2::new(1.0, 0.0);
        b.velocity = Vec2::new(-1.0, 0.0);

        let collision = get_collision(&a, &b);
        let (ia, ib) = get_impulses(&a, &b, &collision);

        // vrel = (2, 0), normal = (-1, 0): magnitude = -2 * -2 / 2 = 2
        assert!((ia.magnitude - 2.0).abs() < EPS);
        assert_eq!(ia.magnitude, ib.magnitude);
        assert_eq!(ib.direction, -ia.direction);

        a.apply_impulse(ia);
        b.apply_impulse(ib);
        assert!((a.velocity.x + 1.0).abs() < EPS);
        assert!((b.velocity.x - 1.0).abs() < EPS);
    }

    #[test]
    fn test_impulse_against_wall_reflects_movable() {
        let mut a = circle(1, 0.0, 0.0, 1.0);
        a.velocity = Vec2::new(3.0, 0.0);
        let b = wall(2, 1.5, 0.0, 1.0);

        let collision = get_collision(&a, &b);
        let (ia, _) = get_impulses(&a, &b, &collision);
        a.apply_impulse(ia);

        assert!((a.velocity.x + 3.0).abs() < EPS);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_immovable_pair_impulse_is_zero_in_release() {
        let a = wall(1, 0.0, 0.0, 1.0);
        let b = wall(2, 1.0, 0.0, 1.0);
        let collision = get_collision(&a, &b);
        let (ia, ib) = get_impulses(&a, &b, &collision);
        assert_eq!(ia.magnitude, 0.0);
        assert_eq!(ib.magnitude, 0.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "immovable pair")]
    fn test_immovable_pair_impulse_panics_in_debug() {
        let a = wall(1, 0.0, 0.0, 1.0);
        let b = wall(2, 1.0, 0.0, 1.0);
        let collision = get_collision(&a, &b);
        let _ = get_impulses(&a, &b, &collision);
    }
}
