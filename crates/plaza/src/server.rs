//! `PlazaServer` builder and server loop.
//!
//! This is the entry point for running a Plaza field server. It ties
//! together all the layers: transport → protocol → presence → field.

use std::sync::Arc;

use plaza_field::{spawn_field, FieldConfig, FieldHandle};
use plaza_presence::TokenIssuer;
use plaza_protocol::{Codec, JsonCodec};
use plaza_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::PlazaError;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The field
/// handle is itself a cheap clone of an `mpsc::Sender`, so there is no
/// shared mutable state here at all — every mutation goes through the
/// field actor's command channel.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) field: FieldHandle,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Plaza server.
///
/// # Example
///
/// ```rust,ignore
/// use plaza::prelude::*;
///
/// let server = PlazaServer::builder()
///     .bind("0.0.0.0:8080")
///     .secret("swordfish")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct PlazaServerBuilder {
    bind_addr: String,
    secret: String,
    field_config: FieldConfig,
}

impl PlazaServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            secret: String::new(),
            field_config: FieldConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the server secret used to derive per-connection credentials.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }

    /// Sets the field configuration (dimensions, step size, clamping).
    pub fn field_config(mut self, config: FieldConfig) -> Self {
        self.field_config = config;
        self
    }

    /// Builds and starts the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport` as defaults. The field
    /// actor is spawned here; it lives for the life of the server.
    pub async fn build(self) -> Result<PlazaServer<JsonCodec>, PlazaError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let issuer = TokenIssuer::new(self.secret);
        let field = spawn_field(self.field_config, issuer);

        let state = Arc::new(ServerState {
            field,
            codec: JsonCodec,
        });

        Ok(PlazaServer { transport, state })
    }
}

impl Default for PlazaServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Plaza field server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct PlazaServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl<C> PlazaServer<C>
where
    C: Codec + Clone + 'static,
{
    /// Creates a new builder.
    pub fn builder() -> PlazaServerBuilder {
        PlazaServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), PlazaError> {
        tracing::info!("Plaza server running");

        loop {
            match self.transport.accept().await {
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
            }
        }
    }
}
