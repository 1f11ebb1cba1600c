//! Broadcast router: fan-out of session events to the right audience.
//!
//! Every state-changing event produces up to two emissions with
//! different identity projections — a self-facing payload carrying the
//! requester's credential and a peer-facing payload carrying only the
//! public id. The router's job is to get each one to the right set of
//! connections and nowhere else.
//!
//! Delivery is fire-and-forget over per-connection unbounded channels:
//! no acknowledgement, no retry. A receiver whose task has gone away is
//! silently skipped; disconnect cleanup will drop the sender shortly.

use std::collections::HashMap;

use tokio::sync::mpsc;

use plaza_protocol::{MemberRef, ServerMessage};
use plaza_transport::ConnectionId;

/// Channel sender for delivering session events to one connection's
/// relay task.
pub type OutboundSender = mpsc::UnboundedSender<ServerMessage>;

/// Who should receive an emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Only the connection the request came from.
    Requester(ConnectionId),

    /// Every connection except the one given (the requester, or the
    /// member that just disconnected).
    Others(ConnectionId),
}

/// Routes [`ServerMessage`]s to per-connection outbound channels.
pub struct BroadcastRouter {
    senders: HashMap<ConnectionId, OutboundSender>,
}

impl BroadcastRouter {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self {
            senders: HashMap::new(),
        }
    }

    /// Registers a connection's outbound channel.
    pub fn insert(&mut self, conn: ConnectionId, sender: OutboundSender) {
        self.senders.insert(conn, sender);
    }

    /// Drops a connection's outbound channel. No-op if absent.
    pub fn remove(&mut self, conn: ConnectionId) {
        self.senders.remove(&conn);
    }

    /// Delivers a message to the given audience.
    ///
    /// Invariant: a payload carrying a credential is only ever routed to
    /// its owner, so `Others` emissions must use the public projection.
    pub fn deliver(&self, audience: Audience, msg: ServerMessage) {
        match audience {
            Audience::Requester(conn) => {
                self.send_to(conn, msg);
            }
            Audience::Others(excluded) => {
                debug_assert!(
                    !carries_credential(&msg),
                    "credential in a peer-facing payload"
                );
                for conn in self.senders.keys() {
                    if *conn != excluded {
                        self.send_to(*conn, msg.clone());
                    }
                }
            }
        }
    }

    /// Sends to a single connection. Silently drops the message if the
    /// connection is unknown or its relay task is gone.
    fn send_to(&self, conn: ConnectionId, msg: ServerMessage) {
        if let Some(sender) = self.senders.get(&conn) {
            let _ = sender.send(msg);
        }
    }

    /// Returns the number of registered connections.
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    /// Returns `true` if no connections are registered.
    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

impl Default for BroadcastRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// `true` if the payload contains a secret credential and must therefore
/// never reach anyone but its owner.
fn carries_credential(msg: &ServerMessage) -> bool {
    matches!(
        msg,
        ServerMessage::Token { .. }
            | ServerMessage::MemberJoin {
                who: MemberRef::Secret(_),
                ..
            }
            | ServerMessage::MemberMove {
                who: MemberRef::Secret(_),
                ..
            }
    )
}
