//! `GuestQuestServer` builder and server loop.
//!
//! This is the entry point for running a Guest Quest server. It ties
//! together all the layers: transport → protocol → router → rooms.

use std::future::Future;
use std::sync::Arc;

use guestquest_catalog::CharacterCatalog;
use guestquest_protocol::{Codec, JsonCodec};
use guestquest_room::{GameRegistry, RandomFactory, RoomConfig};
use guestquest_transport::{Transport, WebSocketTransport};

use crate::GuestQuestError;
use crate::handler::handle_connection;
use crate::router::ProtocolRouter;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) router: ProtocolRouter,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Guest Quest server.
///
/// # Example
///
/// ```rust,no_run
/// use guestquest::prelude::*;
///
/// # async fn demo() -> Result<(), GuestQuestError> {
/// let server = GuestQuestServer::builder()
///     .bind("0.0.0.0:3000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct GuestQuestServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    catalog: Option<CharacterCatalog>,
    random: Option<RandomFactory>,
}

impl GuestQuestServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            room_config: RoomConfig::default(),
            catalog: None,
            random: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration every new room starts with.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Uses `catalog` instead of the built-in character sets.
    pub fn catalog(mut self, catalog: CharacterCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Overrides the random source each room shuffles and draws with.
    pub fn random(mut self, random: RandomFactory) -> Self {
        self.random = Some(random);
        self
    }

    /// Binds the listener and builds the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<GuestQuestServer, GuestQuestError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let registry = match self.random {
            Some(random) => GameRegistry::with_random(self.room_config, random),
            None => GameRegistry::new(self.room_config),
        };
        let catalog = self.catalog.unwrap_or_else(CharacterCatalog::builtin);
        tracing::info!(sets = catalog.len(), "character catalog ready");

        let state = Arc::new(ServerState {
            router: ProtocolRouter::new(registry, catalog),
            codec: JsonCodec,
        });

        Ok(GuestQuestServer { transport, state })
    }
}

impl Default for GuestQuestServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Guest Quest server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// accepting connections.
pub struct GuestQuestServer<C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl GuestQuestServer {
    /// Creates a new builder.
    pub fn builder() -> GuestQuestServerBuilder {
        GuestQuestServerBuilder::new()
    }
}

impl<C: Codec> GuestQuestServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), GuestQuestError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes, then stops every
    /// room (cancelling their turn timers) and returns.
    ///
    /// Each accepted connection gets its own handler task.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), GuestQuestError> {
        tracing::info!("Guest Quest server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(
                                    error = %e,
                                    "connection ended with error"
                                );
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        self.state.router.shutdown().await;
        tracing::info!("Guest Quest server stopped");
        Ok(())
    }
}
