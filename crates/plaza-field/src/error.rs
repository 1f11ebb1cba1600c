//! Error types for the field layer.

use plaza_presence::PresenceError;

/// Errors that can occur when talking to the field actor.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    /// The actor's command channel is closed — the field has shut down.
    #[error("field is unavailable")]
    Unavailable,

    /// A store mutation was rejected (duplicate registration, sequence
    /// violation).
    #[error(transparent)]
    Presence(#[from] PresenceError),
}
