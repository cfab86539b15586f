//! Property tests for collision math and the resource ledger.

use proptest::prelude::*;

use mine_arena::core::vec2::Vec2;
use mine_arena::game::resources::{ResourceLedger, ResourceType};
use mine_arena::physics::{are_intersecting, get_collision, CircleRigidBody};

const EPS: f32 = 1e-3;

fn coord() -> impl Strategy<Value = f32> {
    -100.0f32..100.0
}

fn radius() -> impl Strategy<Value = f32> {
    0.1f32..20.0
}

fn mass() -> impl Strategy<Value = f32> {
    0.1f32..50.0
}

fn resource() -> impl Strategy<Value = ResourceType> {
    (0usize..4).prop_map(|i| ResourceType::ALL[i])
}

proptest! {
    #[test]
    fn intersection_matches_distance(
        ax in coord(), ay in coord(), ar in radius(),
        bx in coord(), by in coord(), br in radius(),
    ) {
        let a = CircleRigidBody::new(1, Vec2::new(ax, ay), ar, 1.0);
        let b = CircleRigidBody::new(2, Vec2::new(bx, by), br, 1.0);
        let expected = a.center.distance(b.center) < ar + br;

        prop_assert_eq!(are_intersecting(&a, &b), expected);
        prop_assert_eq!(are_intersecting(&b, &a), expected);
    }

    #[test]
    fn same_id_never_intersects(
        ax in coord(), ay in coord(), ar in radius(),
        bx in coord(), by in coord(), br in radius(),
    ) {
        let a = CircleRigidBody::new(5, Vec2::new(ax, ay), ar, 1.0);
        let b = CircleRigidBody::new(5, Vec2::new(bx, by), br, 1.0);
        prop_assert!(!are_intersecting(&a, &b));
    }

    #[test]
    fn movable_pair_resolution_is_opposite_and_equal(
        ax in coord(), ay in coord(), ar in radius(), am in mass(),
        dx in -10.0f32..10.0, dy in -10.0f32..10.0, br in radius(), bm in mass(),
    ) {
        let a = CircleRigidBody::new(1, Vec2::new(ax, ay), ar, am);
        let b = CircleRigidBody::new(2, Vec2::new(ax + dx, ay + dy), br, bm);
        prop_assume!(are_intersecting(&a, &b));

        let collision = get_collision(&a, &b);
        let (ra, rb) = collision.resolution;

        prop_assert!((ra.length() - rb.length()).abs() < EPS);
        prop_assert!((ra + rb).length() < EPS);
        prop_assert!((collision.normal.length() - 1.0).abs() < EPS);

        // Afterwards the circles just touch
        let gap = (a.center + ra).distance(b.center + rb);
        prop_assert!((gap - (ar + br)).abs() < EPS * (ar + br).max(1.0));
    }

    #[test]
    fn immovable_body_never_moves(
        ax in coord(), ay in coord(), ar in radius(),
        dx in -10.0f32..10.0, dy in -10.0f32..10.0, br in radius(), bm in mass(),
        wall_first in any::<bool>(),
    ) {
        let wall = CircleRigidBody::immovable(1, Vec2::new(ax, ay), ar);
        let other = CircleRigidBody::new(2, Vec2::new(ax + dx, ay + dy), br, bm);
        prop_assume!(are_intersecting(&wall, &other));

        let (wall_resolution, other_resolution) = if wall_first {
            let c = get_collision(&wall, &other);
            (c.resolution.0, c.resolution.1)
        } else {
            let c = get_collision(&other, &wall);
            (c.resolution.1, c.resolution.0)
        };

        prop_assert_eq!(wall_resolution, Vec2::ZERO);
        prop_assert!(other_resolution.is_finite());
    }

    #[test]
    fn add_never_exceeds_max(start in any::<u32>(), amount in any::<u32>(), t in resource()) {
        let mut ledger = ResourceLedger::new();
        ledger.set(1, t, start);

        let applied = ledger.add(1, t, amount);

        prop_assert_eq!(applied.total as u64, (start as u64 + amount as u64).min(u32::MAX as u64));
        prop_assert_eq!(applied.delta, applied.total - start);
    }

    #[test]
    fn subtract_never_goes_below_zero(start in any::<u32>(), amount in any::<u32>(), t in resource()) {
        let mut ledger = ResourceLedger::new();
        ledger.set(1, t, start);

        let applied = ledger.subtract(1, t, amount);

        prop_assert_eq!(applied.total, start.saturating_sub(amount));
        prop_assert_eq!(applied.delta, start - applied.total);
    }

    #[test]
    fn add_then_subtract_restores_balance(start in 0u32..1_000_000, amount in 0u32..1_000_000, t in resource()) {
        let mut ledger = ResourceLedger::new();
        ledger.set(1, t, start);

        ledger.add(1, t, amount);
        ledger.subtract(1, t, amount);

        prop_assert_eq!(ledger.count(1, t), start);
    }

    #[test]
    fn transfer_conserves_total(
        sender in any::<u32>(),
        receiver in any::<u32>(),
        amount in any::<u32>(),
        t in resource(),
    ) {
        let mut ledger = ResourceLedger::new();
        ledger.set(1, t, sender);
        ledger.set(2, t, receiver);
        let before = ledger.total(t);

        let moved = ledger.transfer(1, 2, t, amount);

        prop_assert!(moved.added <= moved.subtracted);
        prop_assert!(ledger.total(t) <= before);
        if moved.added == moved.subtracted {
            prop_assert_eq!(ledger.total(t), before);
        }
        if sender >= amount && receiver.checked_add(amount).is_some() {
            prop_assert_eq!(moved.subtracted, amount);
            prop_assert_eq!(moved.added, amount);
        }
    }
}
