//! `GuessServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → session → room, with
//! the broadcast publisher on the side.

use std::net::SocketAddr;
use std::sync::Arc;

use numguess_broadcast::{BroadcastError, BroadcastEvent, PublishEndpoint, Publisher};
use numguess_protocol::JsonCodec;
use numguess_room::{GameConfig, RandomTargets, RoomCoordinator, TargetSource};
use numguess_transport::{Handshake, TlsTransport, Transport, TransportError};
use rustls::ServerConfig;

use crate::handler::serve_connection;
use crate::NumguessError;

/// Game listener address used when none is given.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:65432";

/// Port of the broadcast endpoint in the server binary.
pub const DEFAULT_BROADCAST_PORT: u16 = 5557;

/// State shared by every session task.
///
/// Owns the one [`RoomCoordinator`] of the process; sessions reach the
/// room only through it.
pub struct ServerState {
    pub(crate) rooms: RoomCoordinator,
    pub(crate) targets: Arc<dyn TargetSource>,
    pub(crate) config: GameConfig,
    pub(crate) codec: JsonCodec,
    pub(crate) publisher: Publisher,
}

impl ServerState {
    pub fn new(config: GameConfig, targets: Arc<dyn TargetSource>, publisher: Publisher) -> Self {
        Self {
            rooms: RoomCoordinator::new(config, Arc::clone(&targets), publisher.clone()),
            targets,
            config,
            codec: JsonCodec,
            publisher,
        }
    }

    pub fn rooms(&self) -> &RoomCoordinator {
        &self.rooms
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }
}

/// Builder for configuring and starting a [`GuessServer`].
///
/// # Example
///
/// ```rust,ignore
/// let server = GuessServer::builder()
///     .bind("0.0.0.0:65432")
///     .tls_config(load_server_config("cert.pem", "key.pem")?)
///     .broadcast("0.0.0.0:5557")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct GuessServerBuilder {
    bind_addr: String,
    tls_config: Option<Arc<ServerConfig>>,
    broadcast_addr: Option<String>,
    game_config: GameConfig,
    targets: Arc<dyn TargetSource>,
}

impl GuessServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            tls_config: None,
            broadcast_addr: None,
            game_config: GameConfig::default(),
            targets: Arc::new(RandomTargets),
        }
    }

    /// Sets the address to bind the game listener to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the certificate chain and key the server presents.
    pub fn tls_config(mut self, config: Arc<ServerConfig>) -> Self {
        self.tls_config = Some(config);
        self
    }

    /// Opens a broadcast endpoint on `addr`. Without it events are
    /// published to in-process subscribers only.
    pub fn broadcast(mut self, addr: &str) -> Self {
        self.broadcast_addr = Some(addr.to_string());
        self
    }

    /// Sets the range and attempt limit. Checked by [`build`](Self::build).
    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    /// Replaces the random number source, e.g. with scripted targets.
    pub fn targets(mut self, targets: Arc<dyn TargetSource>) -> Self {
        self.targets = targets;
        self
    }

    /// Binds the listeners.
    ///
    /// # Errors
    /// Fails if the game config is unplayable, no TLS configuration was
    /// set, or either address cannot be bound. No connection is accepted
    /// before this succeeds.
    pub async fn build(self) -> Result<GuessServer<TlsTransport>, NumguessError> {
        self.game_config
            .validate()
            .map_err(NumguessError::InvalidGameConfig)?;
        let tls = self.tls_config.ok_or(NumguessError::MissingTlsConfig)?;
        let transport = TlsTransport::bind(&self.bind_addr, tls).await?;

        let publisher = Publisher::default();
        let broadcast_addr = match self.broadcast_addr {
            Some(addr) => {
                let endpoint = PublishEndpoint::bind(&addr, publisher.clone()).await?;
                let local = endpoint.local_addr().map_err(BroadcastError::Bind)?;
                endpoint.spawn();
                Some(local)
            }
            None => None,
        };

        let state = Arc::new(ServerState::new(self.game_config, self.targets, publisher));
        Ok(GuessServer {
            transport,
            state,
            broadcast_addr,
        })
    }
}

impl Default for GuessServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A number-guessing server bound to a transport.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct GuessServer<T: Transport> {
    transport: T,
    state: Arc<ServerState>,
    broadcast_addr: Option<SocketAddr>,
}

impl GuessServer<TlsTransport> {
    /// Creates a new builder.
    pub fn builder() -> GuessServerBuilder {
        GuessServerBuilder::new()
    }
}

impl<T: Transport> GuessServer<T> {
    /// Wraps an already bound transport.
    pub fn with_transport(transport: T, state: Arc<ServerState>) -> Self {
        Self {
            transport,
            state,
            broadcast_addr: None,
        }
    }

    /// Returns the local address the game listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Address of the broadcast endpoint, if one was opened.
    pub fn broadcast_addr(&self) -> Option<SocketAddr> {
        self.broadcast_addr
    }

    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// Every accepted socket gets its own task, which runs the handshake
    /// and then the session. Accept and handshake failures are logged and
    /// never stop the loop.
    pub async fn run(mut self) -> Result<(), NumguessError> {
        let addr = self
            .transport
            .local_addr()
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(%addr, "numguess server running");
        self.state.publisher.publish(BroadcastEvent::ServerStarted {
            addr: addr.to_string(),
        });

        loop {
            match self.transport.accept().await {
                Ok(pending) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        let peer = pending.peer_addr();
                        match pending.complete().await {
                            Ok(conn) => serve_connection(conn, state).await,
                            Err(e) => {
                                tracing::warn!(%peer, error = %e, "handshake failed");
                            }
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
