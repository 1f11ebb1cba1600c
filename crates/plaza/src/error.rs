//! Unified error type for the Plaza server.

use plaza_field::FieldError;
use plaza_presence::PresenceError;
use plaza_protocol::ProtocolError;
use plaza_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `plaza` meta-crate deals in this single type; the `#[from]`
/// attributes let `?` convert sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum PlazaError {
    /// A transport-level error (accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A presence-level error (registration, store mutation).
    #[error(transparent)]
    Presence(#[from] PresenceError),

    /// A field-level error (actor gone, rejected command).
    #[error(transparent)]
    Field(#[from] FieldError),
}
