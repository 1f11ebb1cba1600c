//! Error types for the presence layer.

use plaza_transport::ConnectionId;

/// Errors that can occur while mutating the member store.
///
/// All of these are protocol-sequence violations by a single connection,
/// never fatal to the server. The layer above reports them to the client
/// in the same shape as a failed credential check, without distinguishing
/// the exact cause.
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    /// The connection already has a record. Should not occur given one
    /// registration per connection-open event.
    #[error("connection {0} is already registered")]
    DuplicateConnection(ConnectionId),

    /// No record exists for the connection (join before registration
    /// completed, or after disconnect cleanup).
    #[error("connection {0} is not registered")]
    NotRegistered(ConnectionId),

    /// The connection already completed a join; a second join is a
    /// client bug.
    #[error("connection {0} already joined")]
    AlreadyJoined(ConnectionId),

    /// The connection has not joined yet, so it has no position to
    /// update.
    #[error("connection {0} has not joined")]
    NotJoined(ConnectionId),
}
