//! # Gamenight
//!
//! Authoritative real-time session server for two lightweight two-player
//! games: a turn-based deduction game and a maze-race arcade game. The
//! server owns every rule — clients render state and send intents.
//!
//! The stack, bottom to top:
//!
//! ```text
//! gamenight-protocol   wire types, commands, codec
//! gamenight-guess      deduction simulation (pure)
//! gamenight-maze       maze-race simulation (pure)
//! gamenight-session    registry, session actors, lifecycle, events
//! gamenight            this crate: WebSocket server + handlers
//! ```
//!
//! All state is in-memory and dies with the process. That is a deliberate
//! trade for short-lived casual sessions: a crash ends every live game,
//! and clients start fresh.

mod error;
mod handler;
mod server;

pub use error::GamenightError;
pub use server::{GameServer, GameServerBuilder};

/// Initialises tracing from `RUST_LOG` (defaulting to `info`).
///
/// Call once at startup in binaries; tests and embedders may install
/// their own subscriber instead.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Everything a server binary or integration test needs.
pub mod prelude {
    pub use crate::{GameServer, GameServerBuilder, GamenightError, init_tracing};

    pub use gamenight_guess::{Character, demo_catalog};
    pub use gamenight_maze::{MAZE_COLS, MAZE_ROWS, MazeSnapshot};
    pub use gamenight_protocol::{
        ClientCommand, Codec, Direction, GameId, GameKind, JsonCodec, Phase,
        PlayerInfo, UserId,
    };
    pub use gamenight_session::{
        Engine, GameOverState, GameView, ServerEvent, SessionConfig,
    };
}
