//! Mine Arena Game Server
//!
//! Authoritative game server binary.
//!
//! ```text
//! mine-arena-server [config.json]          serve WebSocket clients
//! mine-arena-server --demo [config.json]   run a headless match and verify replay
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mine_arena::{
    AppConfig, VERSION,
    game::{
        controller::{GameConfig, GameController},
        input::InputFrame,
    },
    network::server::GameServer,
};

/// Ticks simulated by the demo (one minute at the default step).
const DEMO_TICKS: u32 = 3750;

/// Clients joined by the demo.
const DEMO_CLIENTS: u32 = 4;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut demo = false;
    let mut config_path = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--demo" => demo = true,
            _ => config_path = Some(arg),
        }
    }

    let config = match &config_path {
        Some(path) => AppConfig::load(path).with_context(|| format!("loading {}", path))?,
        None => AppConfig::default(),
    };

    info!("Mine Arena Server v{}", VERSION);
    info!(
        "Step: {} ms, players: {}, mines: {}",
        config.game.time_step_ms, config.game.max_player_count, config.game.max_mine_count
    );

    if demo {
        return demo_match(&config.game);
    }

    let server = GameServer::new(config.server, config.game);
    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            server.shutdown();
        }
    }

    Ok(())
}

/// Scripted stick input for a client at a tick.
fn demo_input(client_id: u32, tick: u32) -> InputFrame {
    let angle = (tick as i32 * (client_id as i32 + 1) * 7) % 360;
    let move_x = ((angle % 127) - 63) as i8;
    let move_y = (((angle + 90) % 127) - 63) as i8;
    InputFrame::with_movement(move_x, move_y)
}

/// Play one scripted match with uneven frame times.
fn run_scripted(config: &GameConfig) -> anyhow::Result<GameController> {
    let mut game = GameController::new(config.clone());
    for client_id in 1..=DEMO_CLIENTS {
        game.create_player_with_group(client_id)?;
    }

    let step = config.time_step_ms.max(1);
    let mut total_collisions = 0;
    let mut total_harvested = 0u64;
    let mut frame = 0u32;

    while game.tick() < DEMO_TICKS {
        for client_id in 1..=DEMO_CLIENTS {
            game.set_input(client_id, demo_input(client_id, game.tick()));
        }

        // Jittery frames: between half a step and two steps
        let frame_ms = step / 2 + frame.wrapping_mul(7919) % (step * 3 / 2 + 1);
        let result = game.update(frame_ms);
        total_collisions += result.collisions;
        total_harvested += result.harvested as u64;
        frame += 1;

        if result.ticks > 0 && game.tick() % 600 < result.ticks {
            info!(
                "Tick {}: {} collisions, {} harvested so far",
                game.tick(),
                total_collisions,
                total_harvested
            );
        }
    }

    info!("Frames: {}, collisions: {}, harvested: {}", frame, total_collisions, total_harvested);
    Ok(game)
}

/// Demo function to test the simulation.
fn demo_match(config: &GameConfig) -> anyhow::Result<()> {
    info!("=== Starting Demo Match ===");
    info!("RNG Seed: {}", config.rng_seed);

    let game = run_scripted(config)?;
    let state = game.get_game_state();
    let hash = state.compute_hash();

    info!("=== Match Results ===");
    for player in &state.player_updates {
        if player.is_active {
            info!("Player {} (client {}): {:?}", player.player_id, player.client_id, player.resources);
        }
    }
    info!("Final State Hash: {}", hex::encode(hash));

    let bytes = state.to_bytes()?;
    info!("Snapshot: {} records, {} bytes", state.record_count(), bytes.len());

    info!("=== Verifying Determinism ===");
    let replay = run_scripted(config)?;
    let replay_hash = replay.get_game_state().compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash == replay_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
    } else {
        warn!("DETERMINISM FAILURE: Hashes differ!");
    }

    info!("=== Verifying Replication ===");
    let mut replica = GameController::new(config.clone());
    let report = replica.apply_game_state(&mine_arena::GameState::from_bytes(&bytes)?)?;
    let replica_hash = replica.get_game_state().compute_hash();
    info!(
        "Applied {} records, skipped {}: {}",
        report.applied,
        report.skipped,
        if replica_hash == hash { "replica matches" } else { "replica differs" }
    );

    Ok(())
}
