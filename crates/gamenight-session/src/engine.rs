//! The engine facade: what connection handlers (and the thin
//! request/response surface) talk to.
//!
//! The engine owns the registry, spawns a session actor per game, and
//! routes every validated [`ClientCommand`] to the right actor. It is
//! constructed once at process start and shared via `Arc` — there is no
//! ambient global state anywhere in the workspace.

use tokio::sync::Mutex;

use gamenight_guess::{Character, GuessGame, demo_catalog};
use gamenight_maze::MazeGame;
use gamenight_protocol::{ClientCommand, GameId, GameKind, PlayerInfo, UserId};

use crate::actor::{SessionHandle, SessionInfo, spawn_session};
use crate::clock::now_ms;
use crate::event::{EventSender, GameView, ServerEvent};
use crate::registry::Registry;
use crate::{Reject, SessionConfig};

/// A (game, user) pair a connection has bound itself to, returned from
/// join/rejoin so the transport can report disconnects later.
pub type Binding = (GameId, UserId);

/// The session engine. One per process.
pub struct Engine {
    registry: Mutex<Registry>,
    config: SessionConfig,
    catalog: Vec<Character>,
}

impl Engine {
    /// Creates an engine with the built-in demo catalog.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_catalog(config, demo_catalog())
    }

    /// Creates an engine with an injected character catalog.
    pub fn with_catalog(config: SessionConfig, catalog: Vec<Character>) -> Self {
        Self {
            registry: Mutex::new(Registry::new()),
            config,
            catalog,
        }
    }

    /// Handles one client command.
    ///
    /// Events flow back through `sender`; the returned binding (for join
    /// and rejoin) tells the transport which session to notify when this
    /// connection drops. A `Reject` is for the acting client only — the
    /// caller turns it into an error event, nothing was mutated and
    /// nothing was broadcast.
    pub async fn handle(
        &self,
        command: ClientCommand,
        sender: &EventSender,
    ) -> Result<Option<Binding>, Reject> {
        match command {
            ClientCommand::CreateGame {
                game,
                creator,
                opponent,
            } => {
                let game_id = self.create(game, creator, opponent).await;
                let _ = sender.send(ServerEvent::GameCreated { game_id });
                Ok(None)
            }

            ClientCommand::JoinLobby {
                game_id,
                user_id,
                display_name,
                avatar,
            } => {
                let handle = self.lookup(game_id).await?;
                handle
                    .join(user_id.clone(), display_name, avatar, sender.clone())
                    .await?;
                Ok(Some((game_id, user_id)))
            }

            ClientCommand::RejoinGame { game_id, user_id } => {
                let handle = self.lookup(game_id).await?;
                handle.rejoin(user_id.clone(), sender.clone()).await?;
                Ok(Some((game_id, user_id)))
            }

            ClientCommand::PlayerReady { game_id, user_id } => {
                self.lookup(game_id).await?.ready(user_id).await?;
                Ok(None)
            }

            ClientCommand::CancelGame { game_id, user_id } => {
                self.lookup(game_id).await?.cancel(user_id).await?;
                Ok(None)
            }

            ClientCommand::Forfeit { game_id, user_id } => {
                self.lookup(game_id).await?.forfeit(user_id).await?;
                Ok(None)
            }

            // Everything else is an in-game command.
            other => {
                let (game_id, user_id, game_cmd) = other
                    .into_game_command()
                    .expect("lifecycle commands handled above");
                self.lookup(game_id).await?.game(user_id, game_cmd).await?;
                Ok(None)
            }
        }
    }

    /// Creates a session of the given kind and returns its id.
    pub async fn create(
        &self,
        kind: GameKind,
        creator: PlayerInfo,
        opponent: PlayerInfo,
    ) -> GameId {
        let mut registry = self.registry.lock().await;
        registry.prune_retired();
        let id = registry.allocate_id();

        let handle = match kind {
            GameKind::Deduction => spawn_session(
                GuessGame::new(
                    id,
                    creator,
                    opponent,
                    self.catalog.clone(),
                    now_ms(),
                    self.config.lobby_ttl.as_millis() as u64,
                ),
                self.config.clone(),
            ),
            GameKind::MazeRace => spawn_session(
                MazeGame::new(
                    id,
                    creator,
                    opponent,
                    now_ms(),
                    self.config.lobby_ttl.as_millis() as u64,
                ),
                self.config.clone(),
            ),
        };

        registry.insert(id, handle);
        tracing::info!(game_id = %id, ?kind, "session created");
        id
    }

    /// Reports a transport disconnect for a bound user.
    pub async fn disconnected(&self, game_id: GameId, user_id: UserId) {
        if let Ok(handle) = self.lookup(game_id).await {
            handle.disconnected(user_id).await;
        }
    }

    /// Session metadata (the request/response `get` surface).
    pub async fn info(&self, game_id: GameId) -> Result<SessionInfo, Reject> {
        self.lookup(game_id).await?.info().await
    }

    /// A user's current view (the request/response read path and tests).
    pub async fn view(&self, game_id: GameId, user_id: UserId) -> Result<GameView, Reject> {
        self.lookup(game_id).await?.view(user_id).await
    }

    /// Removes a session outright. Mostly for administrative tooling;
    /// normal sessions retire on their own.
    pub async fn delete(&self, game_id: GameId) -> bool {
        self.registry.lock().await.remove(game_id).is_some()
    }

    /// Number of live sessions (retired ones are pruned first).
    pub async fn session_count(&self) -> usize {
        let mut registry = self.registry.lock().await;
        registry.prune_retired();
        registry.len()
    }

    /// Looks up a live session handle, treating a retired actor as gone.
    async fn lookup(&self, game_id: GameId) -> Result<SessionHandle, Reject> {
        let mut registry = self.registry.lock().await;
        let handle = registry
            .get(game_id)
            .cloned()
            .ok_or(Reject::NotFound(game_id))?;
        if handle.is_closed() {
            // The actor retired but nothing touched this entry since.
            registry.remove(game_id);
            return Err(Reject::NotFound(game_id));
        }
        Ok(handle)
    }
}
