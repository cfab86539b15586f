//! Fixed-timestep determinism.
//!
//! The same inputs per tick must give the same ticks and the same positions,
//! whatever frame lengths the accumulator is fed with.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use mine_arena::game::controller::{GameConfig, GameController};
use mine_arena::game::input::InputFrame;
use mine_arena::game::state::GameState;

const CLIENTS: u32 = 4;

fn config() -> GameConfig {
    GameConfig {
        max_player_count: CLIENTS,
        max_mine_count: 6,
        ..Default::default()
    }
}

fn joined_game() -> GameController {
    let mut game = GameController::new(config());
    for client_id in 1..=CLIENTS {
        game.create_player_with_group(client_id).unwrap();
    }
    game
}

/// Random stick positions, one row per frame.
fn input_script(seed: u64, frames: usize) -> Vec<Vec<InputFrame>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..frames)
        .map(|_| {
            (0..CLIENTS)
                .map(|_| {
                    if rng.gen_bool(0.1) {
                        InputFrame::new()
                    } else {
                        InputFrame::with_movement(rng.gen_range(-127..=127), rng.gen_range(-127..=127))
                    }
                })
                .collect()
        })
        .collect()
}

/// Random frame lengths in ms.
fn frame_script(seed: u64, frames: usize) -> Vec<u32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..frames).map(|_| rng.gen_range(0..50)).collect()
}

fn run(inputs: &[Vec<InputFrame>], frame_ms: &[u32]) -> (u32, GameState) {
    let mut game = joined_game();
    for (row, ms) in inputs.iter().zip(frame_ms) {
        for (i, frame) in row.iter().enumerate() {
            game.set_input(i as u32 + 1, *frame);
        }
        game.update(*ms);
    }
    (game.tick(), game.get_game_state())
}

#[test]
fn identical_runs_produce_identical_state() {
    let inputs = input_script(7, 400);
    let frames = frame_script(11, 400);

    let (ticks_a, state_a) = run(&inputs, &frames);
    let (ticks_b, state_b) = run(&inputs, &frames);

    assert!(ticks_a > 0);
    assert_eq!(ticks_a, ticks_b);
    assert_eq!(state_a, state_b);
    assert_eq!(state_a.compute_hash(), state_b.compute_hash());
}

#[test]
fn different_seeds_diverge() {
    let frames = frame_script(11, 300);
    let (_, a) = run(&input_script(1, 300), &frames);
    let (_, b) = run(&input_script(2, 300), &frames);
    assert_ne!(a.compute_hash(), b.compute_hash());
}

#[test]
fn frame_split_does_not_change_outcome() {
    // Constant input, so only the accumulator decides how ticks are grouped
    let step = config().time_step_ms;
    let total_ms = step * 240;

    let drive = |frames: &[u32]| {
        let mut game = joined_game();
        for client_id in 1..=CLIENTS {
            game.set_input(client_id, InputFrame::with_movement(100, (client_id as i8) * 20 - 50));
        }
        for ms in frames {
            game.update(*ms);
        }
        (game.tick(), game.accumulator_ms(), game.get_game_state())
    };

    let one_frame = drive(&[total_ms]);

    let per_step = drive(&vec![step; 240]);

    let mut rng = StdRng::seed_from_u64(99);
    let mut jittered = Vec::new();
    let mut remaining = total_ms;
    while remaining > 0 {
        let ms = rng.gen_range(0..=40).min(remaining);
        jittered.push(ms);
        remaining -= ms;
    }
    let jitter = drive(&jittered);

    assert_eq!(one_frame.0, 240);
    assert_eq!(one_frame.1, 0);
    assert_eq!(one_frame, per_step);
    assert_eq!(one_frame, jitter);
}

#[test]
fn snapshot_replication_matches_authority() {
    let inputs = input_script(3, 200);
    let frames = frame_script(5, 200);

    let mut authority = joined_game();
    let mut replica = GameController::new(config());

    for (row, ms) in inputs.iter().zip(&frames) {
        for (i, frame) in row.iter().enumerate() {
            authority.set_input(i as u32 + 1, *frame);
        }
        if authority.update(*ms).ticks > 0 {
            let bytes = authority.get_game_state().to_bytes().unwrap();
            let snapshot = GameState::from_bytes(&bytes).unwrap();
            let report = replica.apply_game_state(&snapshot).unwrap();
            assert_eq!(report.skipped, 0);
        }
    }

    assert_eq!(replica.get_game_state(), authority.get_game_state());
}
