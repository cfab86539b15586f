//! WebSocket Game Server
//!
//! Async WebSocket server for multiplayer connections.
//!
//! One simulation task owns the [`GameController`]. Connection tasks never
//! touch it: joins, inputs and leaves travel to it over an mpsc channel and
//! are applied between frame updates. After an update that ran at least one
//! tick, the task snapshots the game and broadcasts the snapshot to every
//! connection, so no reader can observe a tick in progress.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use serde::{Serialize, Deserialize};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};

use crate::game::controller::{GameConfig, GameController, GameError};
use crate::game::input::InputFrame;
use crate::game::objects::ClientId;
use crate::game::state::GameState;
use crate::network::protocol::{
    ClientMessage, ErrorCode, GameInput, ServerError, ServerMessage, WelcomeInfo,
};
use crate::physics::body::EntityId;

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Simulation frames per second (each frame may run several ticks).
    pub frame_rate: u32,
    /// Send snapshots as bincode binary frames instead of JSON.
    pub binary_state: bool,
    /// Server version string.
    #[serde(skip, default = "default_version")]
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_connections: 64,
            frame_rate: 60,
            binary_state: false,
            version: default_version(),
        }
    }
}

/// Highest frame rate that still leaves a whole millisecond per frame.
pub const MAX_FRAME_RATE: u32 = 1000;

impl ServerConfig {
    /// Interval between simulation frames, never shorter than 1 ms.
    pub fn frame_period(&self) -> Duration {
        let rate = self.frame_rate.clamp(1, MAX_FRAME_RATE);
        Duration::from_millis((1000 / rate) as u64)
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Simulation task is gone.
    #[error("Simulation stopped")]
    SimulationStopped,
}

/// Requests from connection tasks to the simulation task.
#[derive(Debug)]
enum SimCommand {
    Join {
        client_id: ClientId,
        reply: oneshot::Sender<Result<WelcomeInfo, GameError>>,
    },
    Input {
        client_id: ClientId,
        frame: InputFrame,
    },
    Leave {
        client_id: ClientId,
    },
}

/// Connected client state.
struct ConnectedClient {
    /// Remote address.
    addr: SocketAddr,
    /// Player controlled by this client, once joined.
    player_id: Option<EntityId>,
    /// Connection time.
    connected_at: Instant,
}

type Clients = Arc<RwLock<BTreeMap<ClientId, ConnectedClient>>>;

/// The game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Configuration for the hosted game.
    game_config: GameConfig,
    /// Connected clients.
    clients: Clients,
    /// Next connection id.
    next_client_id: Arc<AtomicU32>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server.
    pub fn new(config: ServerConfig, game_config: GameConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            game_config,
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            next_client_id: Arc::new(AtomicU32::new(1)),
            shutdown_tx,
        }
    }

    /// Bind the configured address and serve until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown.
    #[instrument(skip(self, listener))]
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GameServerError> {
        info!("Game server listening on {}", listener.local_addr()?);

        let (command_tx, command_rx) = mpsc::channel::<SimCommand>(1024);
        let (state_tx, _) = broadcast::channel::<Arc<GameState>>(16);

        let simulation = tokio::spawn(Self::run_simulation(
            self.game_config.clone(),
            self.config.clone(),
            command_rx,
            state_tx.clone(),
            self.shutdown_tx.subscribe(),
        ));

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let clients_count = self.clients.read().await.len();
                            if clients_count >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                tokio::spawn(reject_overloaded(stream, addr));
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr, command_tx.clone(), state_tx.subscribe());
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        drop(command_tx);
        if simulation.await.is_err() {
            return Err(GameServerError::SimulationStopped);
        }

        Ok(())
    }

    /// Own the game and drive it at the configured frame rate.
    async fn run_simulation(
        game_config: GameConfig,
        config: ServerConfig,
        mut commands: mpsc::Receiver<SimCommand>,
        states: broadcast::Sender<Arc<GameState>>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        let mut game = GameController::new(game_config);

        let mut ticker = interval(config.frame_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_frame = Instant::now();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // Only whole milliseconds are consumed; the rest stays on the clock
                    let frame_ms = last_frame.elapsed().as_millis().min(u32::MAX as u128) as u32;
                    last_frame += Duration::from_millis(frame_ms as u64);

                    let result = game.update(frame_ms);
                    if result.ticks > 0 {
                        // No receivers is fine
                        let _ = states.send(Arc::new(game.get_game_state()));
                    }
                }
                command = commands.recv() => {
                    match command {
                        Some(command) => Self::apply_command(&mut game, &config, command),
                        None => break,
                    }
                }
                _ = shutdown_rx.recv() => {
                    break;
                }
            }
        }

        info!(tick = game.tick(), elapsed_ms = game.elapsed_ms(), "Simulation stopped");
    }

    fn apply_command(game: &mut GameController, config: &ServerConfig, command: SimCommand) {
        match command {
            SimCommand::Join { client_id, reply } => {
                let result = game.create_player_with_group(client_id).map(|player_id| WelcomeInfo {
                    client_id,
                    player_id,
                    tick: game.tick(),
                    time_step_ms: game.config().time_step_ms,
                    server_version: config.version.clone(),
                });
                if reply.send(result).is_err() {
                    // Connection dropped while waiting
                    game.remove_client(client_id);
                }
            }
            SimCommand::Input { client_id, frame } => {
                game.set_input(client_id, frame);
            }
            SimCommand::Leave { client_id } => {
                game.remove_client(client_id);
            }
        }
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(
        &self,
        stream: TcpStream,
        addr: SocketAddr,
        commands: mpsc::Sender<SimCommand>,
        mut states: broadcast::Receiver<Arc<GameState>>,
    ) {
        let clients = self.clients.clone();
        let binary_state = self.config.binary_state;
        let client_id = self.next_client_id.fetch_add(1, Ordering::Relaxed);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(64);

            clients.write().await.insert(client_id, ConnectedClient {
                addr,
                player_id: None,
                connected_at: Instant::now(),
            });

            // Join the game
            let (reply_tx, reply_rx) = oneshot::channel();
            let joined = match commands.send(SimCommand::Join { client_id, reply: reply_tx }).await {
                Ok(()) => reply_rx.await.ok(),
                Err(_) => None,
            };

            let welcome = match joined {
                Some(Ok(welcome)) => welcome,
                Some(Err(e)) => {
                    warn!(client_id, "Join rejected: {}", e);
                    let code = match e {
                        GameError::ArenaFull { .. } => ErrorCode::ArenaFull,
                        _ => ErrorCode::InternalError,
                    };
                    let rejection = ServerMessage::Error(ServerError { code, message: e.to_string() });
                    if let Ok(text) = rejection.to_json() {
                        let _ = ws_sender.send(Message::Text(text)).await;
                    }
                    let _ = ws_sender.close().await;
                    clients.write().await.remove(&client_id);
                    return;
                }
                None => {
                    error!(client_id, "Simulation unavailable");
                    clients.write().await.remove(&client_id);
                    return;
                }
            };

            if let Some(client) = clients.write().await.get_mut(&client_id) {
                client.player_id = Some(welcome.player_id);
            }
            info!(client_id, player_id = welcome.player_id, "Client {} joined", addr);
            let _ = msg_tx.send(ServerMessage::Welcome(welcome)).await;

            // Direct messages first, then snapshots
            let sender_task = tokio::spawn(async move {
                loop {
                    let frame = tokio::select! {
                        biased;
                        msg = msg_rx.recv() => {
                            let Some(msg) = msg else { break };
                            match msg.to_json() {
                                Ok(text) => Message::Text(text),
                                Err(e) => {
                                    error!("Failed to serialize message: {}", e);
                                    continue;
                                }
                            }
                        }
                        state = states.recv() => {
                            let state = match state {
                                Ok(state) => state,
                                Err(RecvError::Lagged(skipped)) => {
                                    debug!(client_id, skipped, "Client lagging, snapshots dropped");
                                    continue;
                                }
                                Err(RecvError::Closed) => break,
                            };
                            let encoded = if binary_state {
                                state.to_bytes().map(Message::Binary).map_err(|e| e.to_string())
                            } else {
                                ServerMessage::State(GameState::clone(&state))
                                    .to_json()
                                    .map(Message::Text)
                                    .map_err(|e| e.to_string())
                            };
                            match encoded {
                                Ok(frame) => frame,
                                Err(e) => {
                                    error!("Failed to encode snapshot: {}", e);
                                    continue;
                                }
                            }
                        }
                    };

                    if ws_sender.send(frame).await.is_err() {
                        break;
                    }
                }
                let _ = ws_sender.close().await;
            });

            // Handle incoming messages
            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        let client_msg = match msg {
                            Some(Ok(Message::Text(text))) => match ClientMessage::from_json(&text) {
                                Ok(m) => m,
                                Err(e) => {
                                    debug!("Invalid message from {}: {}", addr, e);
                                    let _ = msg_tx.send(ServerMessage::Error(ServerError {
                                        code: ErrorCode::InvalidInput,
                                        message: "Invalid message format".to_string(),
                                    })).await;
                                    continue;
                                }
                            },
                            Some(Ok(Message::Binary(data))) => match GameInput::from_bytes(&data) {
                                Ok(input) => ClientMessage::Input(input),
                                Err(e) => {
                                    debug!("Invalid binary input from {}: {}", addr, e);
                                    continue;
                                }
                            },
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                error!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            // Ping/pong frames are answered by tungstenite
                            Some(Ok(_)) => continue,
                        };

                        match client_msg {
                            ClientMessage::Input(input) => {
                                let command = SimCommand::Input {
                                    client_id,
                                    frame: input.to_input_frame(),
                                };
                                if commands.send(command).await.is_err() {
                                    break;
                                }
                            }
                            ClientMessage::Ping { timestamp } => {
                                let _ = msg_tx.send(ServerMessage::Pong {
                                    timestamp,
                                    server_time: std::time::SystemTime::now()
                                        .duration_since(std::time::UNIX_EPOCH)
                                        .unwrap_or_default()
                                        .as_millis() as u64,
                                }).await;
                            }
                            ClientMessage::Leave => {
                                debug!("Client {} left", addr);
                                break;
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        let _ = msg_tx.send(ServerMessage::Shutdown {
                            reason: "Server shutting down".to_string(),
                        }).await;
                        break;
                    }
                }
            }

            // Cleanup
            let _ = commands.send(SimCommand::Leave { client_id }).await;
            drop(msg_tx);
            if tokio::time::timeout(Duration::from_secs(1), sender_task).await.is_err() {
                debug!(client_id, "Sender did not drain in time");
            }

            if let Some(client) = clients.write().await.remove(&client_id) {
                info!(
                    client_id,
                    player_id = ?client.player_id,
                    connected_secs = client.connected_at.elapsed().as_secs(),
                    "Client {} cleaned up",
                    client.addr
                );
            }
        });
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }
}

/// Finish the handshake only to tell the client the server is full.
async fn reject_overloaded(stream: TcpStream, addr: SocketAddr) {
    let mut ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            debug!("Handshake with rejected client {} failed: {}", addr, e);
            return;
        }
    };

    let rejection = ServerMessage::Error(ServerError {
        code: ErrorCode::ServerOverloaded,
        message: "Connection limit reached".to_string(),
    });
    if let Ok(text) = rejection.to_json() {
        let _ = ws_stream.send(Message::Text(text)).await;
    }
    let _ = ws_stream.close(None).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::connect_async;

    fn local_config() -> ServerConfig {
        ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.frame_rate, 60);
        assert_eq!(config.max_connections, 64);
        assert_eq!(config.bind_addr.port(), 8080);
        assert!(!config.binary_state);
        assert_eq!(config.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_server_config_from_partial_json() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"bind_addr":"127.0.0.1:9000","binary_state":true}"#).unwrap();
        assert_eq!(config.bind_addr.port(), 9000);
        assert!(config.binary_state);
        assert_eq!(config.frame_rate, 60);
        assert_eq!(config.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_frame_period_never_zero() {
        let period = |frame_rate| ServerConfig { frame_rate, ..Default::default() }.frame_period();
        assert_eq!(period(60), Duration::from_millis(16));
        assert_eq!(period(1000), Duration::from_millis(1));
        assert_eq!(period(2000), Duration::from_millis(1));
        assert_eq!(period(0), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_server_creation() {
        let server = GameServer::new(local_config(), GameConfig::default());
        assert_eq!(server.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_server_shutdown() {
        let server = GameServer::new(local_config(), GameConfig::default());
        server.shutdown();
        // Should not panic
    }

    #[tokio::test]
    async fn test_client_joins_and_receives_state() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = Arc::new(GameServer::new(local_config(), GameConfig::default()));
        let serving = server.clone();
        let handle = tokio::spawn(async move { serving.serve(listener).await });

        let (mut ws, _) = connect_async(format!("ws://{}", addr)).await.unwrap();

        let input = ClientMessage::Input(GameInput { move_x: 127, move_y: 0 });
        let mut welcomed = None;
        let mut saw_state = false;

        let exchange = async {
            while let Some(Ok(msg)) = ws.next().await {
                let Message::Text(text) = msg else { continue };
                match ServerMessage::from_json(&text).unwrap() {
                    ServerMessage::Welcome(info) => {
                        welcomed = Some(info);
                        ws.send(Message::Text(input.to_json().unwrap())).await.unwrap();
                    }
                    ServerMessage::State(state) if welcomed.is_some() => {
                        let player_id = welcomed.as_ref().unwrap().player_id;
                        let me = state.player_updates.iter().find(|p| p.player_id == player_id);
                        if me.is_some_and(|p| p.is_active) {
                            saw_state = true;
                            break;
                        }
                    }
                    _ => {}
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(5), exchange).await.unwrap();

        let welcome = welcomed.unwrap();
        assert_eq!(welcome.client_id, 1);
        assert_eq!(welcome.time_step_ms, GameConfig::default().time_step_ms);
        assert!(saw_state);

        server.shutdown();
        let result = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap();
        assert!(result.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_connection_over_limit_gets_overloaded_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let config = ServerConfig { max_connections: 0, ..local_config() };
        let server = Arc::new(GameServer::new(config, GameConfig::default()));
        let serving = server.clone();
        let handle = tokio::spawn(async move { serving.serve(listener).await });

        let (mut ws, _) = connect_async(format!("ws://{}", addr)).await.unwrap();

        let first_text = async {
            while let Some(Ok(msg)) = ws.next().await {
                if let Message::Text(text) = msg {
                    return Some(ServerMessage::from_json(&text).unwrap());
                }
            }
            None
        };
        let reply = tokio::time::timeout(Duration::from_secs(5), first_text).await.unwrap();

        match reply {
            Some(ServerMessage::Error(err)) => assert_eq!(err.code, ErrorCode::ServerOverloaded),
            other => panic!("expected overloaded error, got {:?}", other),
        }
        assert_eq!(server.connection_count().await, 0);

        server.shutdown();
        let result = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap();
        assert!(result.unwrap().is_ok());
    }
}
