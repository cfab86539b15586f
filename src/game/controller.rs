//! Game Controller
//!
//! Root of the simulation. Owns physics, entity records, resource ledger and
//! event queue, and advances them in fixed steps drained from an accumulator
//! of real frame time.
//!
//! ## Tick Order
//!
//! 1. Pre-physics: inputs onto players, player directions onto group forces
//! 2. Physics: integrate, resolve pairs, queue collision events
//! 3. Post-physics: clamp groups to the arena, retire empty mines,
//!    group bodies follow their player's active flag
//! 4. Flush: drain the event queue, including events queued by handlers
//! 5. Increment the tick counter
//!
//! Snapshots are only produced or applied between calls, never mid-tick.

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info, warn};

#[cfg(feature = "debug-tracing")]
use tracing::trace;

use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;
use crate::game::events::{Event, EventQueue};
use crate::game::input::{ClientInputs, InputFrame};
use crate::game::objects::ClientId;
use crate::game::resources::{ResourceLedger, ResourceType, RESOURCE_TYPE_COUNT};
use crate::game::state::{
    ApplyReport, GameState, GroupUpdate, MineUpdate, PlayerUpdate, SnapshotError,
};
use crate::game::store::GameObjectStore;
use crate::game::systems::{
    apply_player_inputs, clamp_groups_to_arena, drive_groups, react_to_collision,
    retire_depleted_mines, sync_group_activity, ReactionTuning,
};
use crate::physics::body::{CircleRigidBody, EntityId};
use crate::physics::controller::{PhysicsConfig, PhysicsController};

/// Configuration for a game.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Fixed simulation step (ms)
    pub time_step_ms: u32,
    /// Player slots (each with one group)
    pub max_player_count: u32,
    /// Mine slots
    pub max_mine_count: u32,
    /// Arena spans `[-half, +half]` on each axis
    pub arena_half_extents: Vec2,
    /// Group body radius
    pub group_radius: f32,
    /// Group body mass
    pub group_mass: f32,
    /// Force applied along a full-tilt input direction
    pub group_move_force: f32,
    /// Mine body radius
    pub mine_radius: f32,
    /// Units a freshly created mine holds
    pub mine_stock: u32,
    /// Units of each resource taken per group-mine contact
    pub harvest_amount: u32,
    /// Multiplier on collision knockback
    pub knockback_scale: f32,
    /// Seed for spawn placement
    pub rng_seed: u64,
    /// Physics tuning
    pub physics: PhysicsConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            time_step_ms: crate::DEFAULT_TIME_STEP_MS,
            max_player_count: 8,
            max_mine_count: 10,
            arena_half_extents: Vec2::new(800.0, 600.0),
            group_radius: 20.0,
            group_mass: 1.0,
            group_move_force: 2000.0,
            mine_radius: 40.0,
            mine_stock: 100,
            harvest_amount: 1,
            knockback_scale: 50.0,
            rng_seed: 0x5EED_CAFE,
            physics: PhysicsConfig::default(),
        }
    }
}

/// Rejected entity operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Every player slot is taken
    #[error("arena is full ({max} players)")]
    ArenaFull {
        /// Configured player slots
        max: u32,
    },

    /// Every mine slot holds an active mine
    #[error("all {max} mine slots are in use")]
    MinesFull {
        /// Configured mine slots
        max: u32,
    },

    /// Client already controls a player
    #[error("client {client_id} already controls player {player_id}")]
    AlreadyJoined {
        /// Client
        client_id: ClientId,
        /// Its player
        player_id: EntityId,
    },

    /// No such active player
    #[error("unknown player {0}")]
    UnknownPlayer(EntityId),
}

/// Result of one fixed step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickResult {
    /// Tick number after the step
    pub tick: u32,
    /// Collisions resolved during the step
    pub collisions: usize,
    /// Resource units harvested from mines
    pub harvested: u32,
    /// Mines that ran dry and were deactivated
    pub retired_mines: Vec<EntityId>,
}

/// Result of one frame update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateResult {
    /// Fixed steps executed
    pub ticks: u32,
    /// Collisions across all steps
    pub collisions: usize,
    /// Resource units harvested across all steps
    pub harvested: u32,
}

/// Fixed-timestep simulation root.
#[derive(Debug)]
pub struct GameController {
    config: GameConfig,
    physics: PhysicsController,
    store: GameObjectStore,
    ledger: ResourceLedger,
    events: EventQueue,
    rng: DeterministicRng,
    pending_inputs: ClientInputs,
    tick: u32,
    accumulator_ms: u32,
    elapsed_ms: u64,
    mines_created: u32,
    last_applied_tick: Option<u32>,
}

impl GameController {
    /// Create a game, load its level and place every mine.
    pub fn new(config: GameConfig) -> Self {
        let mut controller = Self {
            physics: PhysicsController::new(config.physics.clone()),
            store: GameObjectStore::new(),
            ledger: ResourceLedger::new(),
            events: EventQueue::new(),
            rng: DeterministicRng::new(config.rng_seed),
            pending_inputs: ClientInputs::new(),
            tick: 0,
            accumulator_ms: 0,
            elapsed_ms: 0,
            mines_created: 0,
            last_applied_tick: None,
            config,
        };

        controller.load_level();
        for _ in 0..controller.config.max_mine_count {
            if let Err(e) = controller.create_mine() {
                warn!("Level load stopped placing mines: {}", e);
                break;
            }
        }

        info!(
            players = controller.config.max_player_count,
            mines = controller.config.max_mine_count,
            step_ms = controller.config.time_step_ms,
            "Game level loaded"
        );

        controller
    }

    /// Allocate every player/group pair and mine slot, all inactive.
    fn load_level(&mut self) {
        for _ in 0..self.config.max_player_count {
            let (_, group_id) = self.store.add_player_slot();
            let mut body = CircleRigidBody::new(
                group_id,
                Vec2::ZERO,
                self.config.group_radius,
                self.config.group_mass,
            );
            body.active = false;
            self.physics.insert(body);
        }

        for _ in 0..self.config.max_mine_count {
            let mine_id = self.store.add_mine_slot();
            let mut body = CircleRigidBody::immovable(mine_id, Vec2::ZERO, self.config.mine_radius);
            body.active = false;
            self.physics.insert(body);
        }
    }

    // =========================================================================
    // ENTITY LIFECYCLE
    // =========================================================================

    /// Bind a client to a free player slot and spawn its group.
    pub fn create_player_with_group(&mut self, client_id: ClientId) -> Result<EntityId, GameError> {
        if let Some(player) = self.store.player_for_client(client_id) {
            return Err(GameError::AlreadyJoined { client_id, player_id: player.id });
        }

        let player_id = self.store.free_player_slot().ok_or(GameError::ArenaFull {
            max: self.config.max_player_count,
        })?;

        let spawn = self
            .rng
            .random_position(self.config.arena_half_extents, self.config.group_radius);

        let group_id = match self.store.player_mut(player_id) {
            Some(player) => {
                player.active = true;
                player.client_id = client_id;
                player.direction = Vec2::ZERO;
                player.group_id
            }
            None => return Err(GameError::UnknownPlayer(player_id)),
        };

        if let Some(body) = self.physics.get_mut(group_id) {
            body.center = spawn;
            body.velocity = Vec2::ZERO;
            body.active = true;
        }

        self.ledger.init(player_id);
        self.events.publish(Event::ClientConnected { client_id, player_id });

        info!(client_id, player_id, group_id, x = spawn.x, y = spawn.y, "Player joined");
        Ok(player_id)
    }

    /// Place a mine in the first unused mine slot and fill its stock.
    ///
    /// Each new mine holds a single resource type, cycling through the types
    /// in order.
    pub fn create_mine(&mut self) -> Result<EntityId, GameError> {
        let mine_id = self
            .store
            .mines()
            .map(|m| m.id)
            .find(|id| self.physics.get(*id).is_some_and(|b| !b.active))
            .ok_or(GameError::MinesFull { max: self.config.max_mine_count })?;

        let position = self
            .rng
            .random_position(self.config.arena_half_extents, self.config.mine_radius);

        if let Some(body) = self.physics.get_mut(mine_id) {
            body.center = position;
            body.active = true;
        }

        let index = self.mines_created as usize % RESOURCE_TYPE_COUNT;
        let resource = ResourceType::from_index(index).unwrap_or(ResourceType::Ore);
        self.mines_created = self.mines_created.wrapping_add(1);

        self.ledger.remove(mine_id);
        self.ledger.set(mine_id, resource, self.config.mine_stock);

        debug!(mine_id, ?resource, stock = self.config.mine_stock, "Mine created");
        Ok(mine_id)
    }

    /// Retire a player slot: deactivate player and group, drop its balance.
    pub fn remove_player(&mut self, player_id: EntityId) -> Result<(), GameError> {
        let (client_id, group_id) = match self.store.player_mut(player_id) {
            Some(player) if player.active => {
                let client_id = player.client_id;
                player.active = false;
                player.client_id = 0;
                player.direction = Vec2::ZERO;
                (client_id, player.group_id)
            }
            _ => return Err(GameError::UnknownPlayer(player_id)),
        };

        if let Some(body) = self.physics.get_mut(group_id) {
            body.active = false;
            body.velocity = Vec2::ZERO;
        }

        self.ledger.remove(player_id);
        self.pending_inputs.remove(&client_id);
        self.events.publish(Event::ClientDisconnected { client_id, player_id });

        info!(client_id, player_id, "Player left");
        Ok(())
    }

    /// Retire the player bound to a client, if any.
    pub fn remove_client(&mut self, client_id: ClientId) -> Option<EntityId> {
        let player_id = self.store.player_for_client(client_id)?.id;
        self.remove_player(player_id).ok()?;
        Some(player_id)
    }

    /// Record a client's latest input. Used from the next frame on.
    pub fn set_input(&mut self, client_id: ClientId, frame: InputFrame) {
        self.pending_inputs.insert(client_id, frame);
    }

    // =========================================================================
    // SIMULATION
    // =========================================================================

    /// Advance by one real frame of `frame_ms` milliseconds.
    ///
    /// Inputs are collected once, then as many fixed steps run as the
    /// accumulated time allows. The remainder carries over to the next frame.
    pub fn update(&mut self, frame_ms: u32) -> UpdateResult {
        let inputs = self.pending_inputs.clone();
        let step_ms = self.config.time_step_ms.max(1);

        self.accumulator_ms = self.accumulator_ms.saturating_add(frame_ms);

        let mut result = UpdateResult::default();
        while self.accumulator_ms >= step_ms {
            let tick = self.step(&inputs);
            self.accumulator_ms -= step_ms;
            self.elapsed_ms += step_ms as u64;

            result.ticks += 1;
            result.collisions += tick.collisions;
            result.harvested = result.harvested.saturating_add(tick.harvested);
        }

        result
    }

    /// Run exactly one fixed step with the given inputs.
    pub fn step(&mut self, inputs: &ClientInputs) -> TickResult {
        let step_ms = self.config.time_step_ms.max(1);
        let mut result = TickResult::default();

        // 1. Pre-physics
        apply_player_inputs(&mut self.store, inputs);
        drive_groups(&self.store, &mut self.physics, self.config.group_move_force);

        // 2. Physics (collisions land in the event queue)
        result.collisions = self.physics.update(step_ms, &mut self.events);

        // 3. Post-physics
        clamp_groups_to_arena(&self.store, &mut self.physics, self.config.arena_half_extents);
        result.retired_mines = retire_depleted_mines(&self.store, &mut self.physics, &self.ledger);
        sync_group_activity(&self.store, &mut self.physics);

        for mine_id in &result.retired_mines {
            debug!(mine_id, tick = self.tick, "Mine depleted");
        }

        // 4. Flush every event raised so far
        result.harvested = self.process_events();

        // 5. Tick complete
        self.tick = self.tick.saturating_add(1);
        result.tick = self.tick;

        #[cfg(feature = "debug-tracing")]
        trace!(tick = self.tick, collisions = result.collisions, "tick complete");

        result
    }

    /// Drain the event queue, dispatching each event.
    ///
    /// Events published by handlers are drained in the same call.
    fn process_events(&mut self) -> u32 {
        let tuning = ReactionTuning {
            knockback_scale: self.config.knockback_scale,
            harvest_amount: self.config.harvest_amount,
        };

        let mut harvested = 0u32;
        while let Some(event) = self.events.pop() {
            match event {
                Event::Collision(collision) => {
                    let outcome = react_to_collision(
                        &collision,
                        &self.store,
                        &mut self.physics,
                        &mut self.ledger,
                        tuning,
                    );
                    harvested = harvested.saturating_add(outcome.harvested);
                }
                Event::ClientConnected { client_id, player_id } => {
                    debug!(client_id, player_id, "connect event dispatched");
                }
                Event::ClientDisconnected { client_id, player_id } => {
                    debug!(client_id, player_id, "disconnect event dispatched");
                }
            }
        }
        harvested
    }

    // =========================================================================
    // SNAPSHOTS
    // =========================================================================

    /// Capture every entity's replicated fields at the current tick.
    pub fn get_game_state(&self) -> GameState {
        let group_updates = self
            .store
            .groups()
            .filter_map(|group| {
                let body = self.physics.get(group.id)?;
                Some(GroupUpdate {
                    group_id: group.id,
                    is_active: body.active,
                    x_pos: body.center.x,
                    y_pos: body.center.y,
                    radius: body.radius,
                    x_vel: body.velocity.x,
                    y_vel: body.velocity.y,
                    player_id: group.player_id,
                })
            })
            .collect();

        let mine_updates = self
            .store
            .mines()
            .filter_map(|mine| {
                let body = self.physics.get(mine.id)?;
                Some(MineUpdate {
                    mine_id: mine.id,
                    is_active: body.active,
                    x_pos: body.center.x,
                    y_pos: body.center.y,
                    radius: body.radius,
                })
            })
            .collect();

        let player_updates = self
            .store
            .players()
            .map(|player| PlayerUpdate {
                player_id: player.id,
                client_id: player.client_id,
                is_active: player.active,
                resources: self.ledger.peek(player.id).copied().unwrap_or_default(),
            })
            .collect();

        GameState {
            tick: self.tick,
            group_updates,
            mine_updates,
            player_updates,
        }
    }

    /// Overwrite local entities from an authoritative snapshot.
    ///
    /// Entities missing from the snapshot are left alone. Records naming an
    /// unknown id, or carrying non-finite or non-positive geometry, are
    /// skipped without aborting the rest. A snapshot older than the last one
    /// applied is rejected as a whole.
    pub fn apply_game_state(&mut self, state: &GameState) -> Result<ApplyReport, SnapshotError> {
        if let Some(last_applied) = self.last_applied_tick {
            if state.tick < last_applied {
                return Err(SnapshotError::Stale {
                    snapshot_tick: state.tick,
                    last_applied,
                });
            }
        }

        let mut report = ApplyReport::default();

        for update in &state.group_updates {
            let center = Vec2::new(update.x_pos, update.y_pos);
            let velocity = Vec2::new(update.x_vel, update.y_vel);
            let owned = self
                .store
                .group(update.group_id)
                .is_some_and(|g| g.player_id == update.player_id);

            match self.physics.get_mut(update.group_id) {
                Some(body) if owned && valid_geometry(center, update.radius) && velocity.is_finite() => {
                    body.center = center;
                    body.radius = update.radius;
                    body.velocity = velocity;
                    body.active = update.is_active;
                    report.applied += 1;
                }
                _ => {
                    debug!(group_id = update.group_id, "group update skipped");
                    report.skipped += 1;
                }
            }
        }

        for update in &state.mine_updates {
            let center = Vec2::new(update.x_pos, update.y_pos);
            let known = self.store.mine(update.mine_id).is_some();

            match self.physics.get_mut(update.mine_id) {
                Some(body) if known && valid_geometry(center, update.radius) => {
                    body.center = center;
                    body.radius = update.radius;
                    body.active = update.is_active;
                    report.applied += 1;
                }
                _ => {
                    debug!(mine_id = update.mine_id, "mine update skipped");
                    report.skipped += 1;
                }
            }
        }

        for update in &state.player_updates {
            match self.store.player_mut(update.player_id) {
                Some(player) => {
                    player.client_id = update.client_id;
                    player.active = update.is_active;
                    for resource in ResourceType::ALL {
                        self.ledger
                            .set(update.player_id, resource, update.resources[resource.index()]);
                    }
                    report.applied += 1;
                }
                None => {
                    debug!(player_id = update.player_id, "player update skipped");
                    report.skipped += 1;
                }
            }
        }

        self.tick = state.tick;
        self.last_applied_tick = Some(state.tick);

        Ok(report)
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Configuration in use.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Ticks completed (or last applied).
    pub fn tick(&self) -> u32 {
        self.tick
    }

    /// Simulated time (ms) run by this controller.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Frame time not yet consumed by a step.
    pub fn accumulator_ms(&self) -> u32 {
        self.accumulator_ms
    }

    /// Physics world.
    pub fn physics(&self) -> &PhysicsController {
        &self.physics
    }

    /// Entity records.
    pub fn store(&self) -> &GameObjectStore {
        &self.store
    }

    /// Resource balances.
    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    /// Mutable resource balances.
    pub fn ledger_mut(&mut self) -> &mut ResourceLedger {
        &mut self.ledger
    }

    /// Events waiting for the next flush.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Player bound to a client.
    pub fn player_for_client(&self, client_id: ClientId) -> Option<EntityId> {
        self.store.player_for_client(client_id).map(|p| p.id)
    }

    /// Group body of a player.
    pub fn group_body(&self, player_id: EntityId) -> Option<&CircleRigidBody> {
        let group_id = self.store.player(player_id)?.group_id;
        self.physics.get(group_id)
    }
}

#[inline]
fn valid_geometry(center: Vec2, radius: f32) -> bool {
    center.is_finite() && radius.is_finite() && radius > 0.0
}

// =============================================================================
// TESTS
// =============================================================================
