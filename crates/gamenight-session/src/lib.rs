//! Session lifecycle for the Gamenight engine.
//!
//! This crate turns the two pure simulations into live, networked
//! sessions. Each session runs as its own Tokio task (an actor) owning
//! its state outright — the single-writer-per-session guarantee is
//! structural, not a locking convention.
//!
//! # Layers
//!
//! ```text
//! Engine (one per process)  ← connection handlers talk to this
//!     │  owns
//! Registry (GameId → SessionHandle)
//!     │  routes to
//! Session actor (one task per session)
//!     │  drives
//! GameRules (GuessGame | MazeGame)  ← the pure simulations
//! ```
//!
//! # Key types
//!
//! - [`Engine`] — create/route/disconnect facade, constructed once
//! - [`Registry`] — the owned keyed store of live sessions
//! - [`SessionHandle`] — talk to one running session actor
//! - [`GameRules`] — the seam a simulation implements
//! - [`ServerEvent`] — everything the engine pushes to clients
//! - [`SessionConfig`] — every timing knob (lobby TTL, grace, tick rate)

mod actor;
mod clock;
mod config;
mod engine;
mod error;
mod event;
mod registry;
mod rules;

pub use actor::{SessionHandle, SessionInfo, spawn_session};
pub use config::SessionConfig;
pub use engine::{Binding, Engine};
pub use error::Reject;
pub use event::{
    EventReceiver, EventSender, GameOverState, GameView, LobbyPlayer, ServerEvent,
};
pub use registry::Registry;
pub use rules::GameRules;
