//! # Plaza
//!
//! A real-time shared-field server for web clients.
//!
//! Plaza lets browser clients connect over a persistent duplex channel,
//! receive a server-issued credential, join a bounded 2D field with an
//! avatar, and move around while every join, move, and departure is
//! relayed live to all other connected clients.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use plaza::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), PlazaError> {
//!     let server = PlazaServer::<plaza_protocol::JsonCodec>::builder()
//!         .bind("0.0.0.0:8080")
//!         .secret("swordfish")
//!         .build()
//!         .await?;
//!     server.run().await
//! }
//! ```

mod error;
mod handler;
mod server;

pub use error::PlazaError;
pub use server::{PlazaServer, PlazaServerBuilder};

/// Commonly used types, re-exported for one-line imports.
pub mod prelude {
    pub use crate::{PlazaError, PlazaServer, PlazaServerBuilder};
    pub use plaza_field::{FieldConfig, FieldHandle};
    pub use plaza_protocol::{
        ClientMessage, Credential, MemberInfo, MemberRef, Position, PublicId,
        ServerMessage,
    };
    pub use plaza_transport::ConnectionId;
}
