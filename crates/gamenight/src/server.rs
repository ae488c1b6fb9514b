//! `GameServer` builder and accept loop.
//!
//! This is the entry point for running a Gamenight server: it binds the
//! listener, constructs the one [`Engine`] the process shares, and spawns
//! a handler task per connection.

use std::sync::Arc;

use tokio::net::TcpListener;

use gamenight_guess::Character;
use gamenight_session::{Engine, SessionConfig};

use crate::GamenightError;
use crate::handler::handle_connection;

/// Builder for configuring and starting a server.
///
/// # Example
///
/// ```rust,no_run
/// use gamenight::prelude::*;
///
/// # async fn run() -> Result<(), GamenightError> {
/// let server = GameServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct GameServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
    catalog: Option<Vec<Character>>,
}

impl GameServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            session_config: SessionConfig::default(),
            catalog: None,
        }
    }

    /// Sets the address to bind to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Overrides the lifecycle timing (lobby TTL, grace, tick period).
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Injects the deduction game's character catalog. The built-in demo
    /// catalog is used when not set.
    pub fn catalog(mut self, catalog: Vec<Character>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Binds the listener and builds the server.
    pub async fn build(self) -> Result<GameServer, GamenightError> {
        let listener = TcpListener::bind(&self.bind_addr).await?;
        tracing::info!(addr = %self.bind_addr, "listener bound");

        let engine = match self.catalog {
            Some(catalog) => Engine::with_catalog(self.session_config, catalog),
            None => Engine::new(self.session_config),
        };

        Ok(GameServer {
            listener,
            engine: Arc::new(engine),
        })
    }
}

impl Default for GameServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Gamenight server.
pub struct GameServer {
    listener: TcpListener,
    engine: Arc<Engine>,
}

impl GameServer {
    pub fn builder() -> GameServerBuilder {
        GameServerBuilder::new()
    }

    /// The address the listener actually bound (useful with port 0).
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// The shared engine, for embedding a request/response surface
    /// (create/get over plain HTTP) next to the socket server.
    pub fn engine(&self) -> Arc<Engine> {
        Arc::clone(&self.engine)
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), GamenightError> {
        tracing::info!("gamenight server running");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    tracing::debug!(%addr, "connection accepted");
                    let engine = Arc::clone(&self.engine);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, engine).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
