//! Field actor: a single Tokio task that owns the authoritative state.
//!
//! All connection events — open, join, move, disconnect — arrive as
//! commands on one mpsc channel and are processed to completion, one at
//! a time, against the member store. That single serialized stream is
//! the whole concurrency story: no event ever observes another event's
//! half-applied mutation, and callers on a multi-threaded runtime never
//! touch the store directly.

use tokio::sync::{mpsc, oneshot};

use plaza_presence::{MemberStore, TokenIssuer};
use plaza_protocol::{Credential, MemberRef, ServerMessage};
use plaza_transport::ConnectionId;

use crate::motion::{apply_move, spawn_position};
use crate::route::{Audience, BroadcastRouter, OutboundSender};
use crate::{FieldConfig, FieldError};

/// Default command channel size for the field actor.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// The one failure message clients ever see for a rejected join or
/// move. Credential mismatches and protocol-sequence violations are
/// deliberately indistinguishable from the outside.
const REJECT_MESSAGE: &str = "invalid token";

/// Commands sent to the field actor through its channel.
pub(crate) enum FieldCommand {
    /// A connection opened: register it, deliver its `token` event.
    Connect {
        conn: ConnectionId,
        sender: OutboundSender,
        reply: oneshot::Sender<Result<PublicIdReply, FieldError>>,
    },

    /// Admission request from a registered connection.
    Join {
        conn: ConnectionId,
        token: Credential,
        avatar: u8,
    },

    /// Movement command from a joined connection.
    Move {
        conn: ConnectionId,
        token: Credential,
        key: u32,
    },

    /// The connection is gone. Safe to send more than once.
    Disconnect { conn: ConnectionId },

    /// Reports the number of currently joined members.
    Occupancy { reply: oneshot::Sender<usize> },
}

/// What [`FieldHandle::connect`] returns: the registered member's
/// public id (useful for logging; the credential itself is delivered
/// over the connection's own outbound channel, never returned here).
pub type PublicIdReply = plaza_protocol::PublicId;

/// Handle to the running field actor. Cheap to clone — it's just an
/// `mpsc::Sender` wrapper. Each connection handler holds one.
#[derive(Clone)]
pub struct FieldHandle {
    sender: mpsc::Sender<FieldCommand>,
}

impl FieldHandle {
    /// Registers a newly opened connection together with its outbound
    /// channel. The actor issues the credential and pushes the `token`
    /// event through `sender` before this returns.
    pub async fn connect(
        &self,
        conn: ConnectionId,
        sender: OutboundSender,
    ) -> Result<PublicIdReply, FieldError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(FieldCommand::Connect {
                conn,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| FieldError::Unavailable)?;
        reply_rx.await.map_err(|_| FieldError::Unavailable)?
    }

    /// Submits a join request (fire-and-forget; the outcome arrives as
    /// a `join-result` event on the connection's outbound channel).
    pub async fn join(
        &self,
        conn: ConnectionId,
        token: Credential,
        avatar: u8,
    ) -> Result<(), FieldError> {
        self.sender
            .send(FieldCommand::Join { conn, token, avatar })
            .await
            .map_err(|_| FieldError::Unavailable)
    }

    /// Submits a movement command (fire-and-forget, like `join`).
    pub async fn move_avatar(
        &self,
        conn: ConnectionId,
        token: Credential,
        key: u32,
    ) -> Result<(), FieldError> {
        self.sender
            .send(FieldCommand::Move { conn, token, key })
            .await
            .map_err(|_| FieldError::Unavailable)
    }

    /// Reports a disconnect. Duplicate or out-of-order signals are
    /// tolerated; anything after the first is a no-op inside the actor.
    pub async fn disconnect(
        &self,
        conn: ConnectionId,
    ) -> Result<(), FieldError> {
        self.sender
            .send(FieldCommand::Disconnect { conn })
            .await
            .map_err(|_| FieldError::Unavailable)
    }

    /// Returns the number of currently joined members.
    pub async fn occupancy(&self) -> Result<usize, FieldError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(FieldCommand::Occupancy { reply: reply_tx })
            .await
            .map_err(|_| FieldError::Unavailable)?;
        reply_rx.await.map_err(|_| FieldError::Unavailable)
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct FieldActor {
    store: MemberStore,
    router: BroadcastRouter,
    config: FieldConfig,
    receiver: mpsc::Receiver<FieldCommand>,
}

impl FieldActor {
    /// Runs the actor loop, processing commands until every handle is
    /// dropped.
    async fn run(mut self) {
        tracing::info!(
            width = self.config.width,
            height = self.config.height,
            "field actor started"
        );

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                FieldCommand::Connect { conn, sender, reply } => {
                    let result = self.handle_connect(conn, sender);
                    let _ = reply.send(result);
                }
                FieldCommand::Join { conn, token, avatar } => {
                    self.handle_join(conn, &token, avatar);
                }
                FieldCommand::Move { conn, token, key } => {
                    self.handle_move(conn, &token, key);
                }
                FieldCommand::Disconnect { conn } => {
                    self.handle_disconnect(conn);
                }
                FieldCommand::Occupancy { reply } => {
                    let _ = reply.send(self.store.joined().len());
                }
            }
        }

        tracing::info!("field actor stopped");
    }

    fn handle_connect(
        &mut self,
        conn: ConnectionId,
        sender: OutboundSender,
    ) -> Result<PublicIdReply, FieldError> {
        let (credential, public_id) = self.store.register(conn)?;

        self.router.insert(conn, sender);
        // The credential goes to its owner and nobody else.
        self.router.deliver(
            Audience::Requester(conn),
            ServerMessage::Token { token: credential },
        );

        Ok(public_id)
    }

    fn handle_join(
        &mut self,
        conn: ConnectionId,
        token: &Credential,
        avatar: u8,
    ) {
        if !self.store.credential_matches(conn, token) {
            tracing::debug!(%conn, "join rejected: credential mismatch");
            self.reject_join(conn);
            return;
        }

        let pos = spawn_position(&self.config, &mut rand::rng());
        if let Err(e) = self.store.complete_join(conn, avatar, pos) {
            tracing::debug!(%conn, error = %e, "join rejected");
            self.reject_join(conn);
            return;
        }

        // complete_join succeeded, so the record exists.
        let Some(record) = self.store.get(conn) else { return };
        let credential = record.credential.clone();
        let public_id = record.public_id;

        // Requester first: the result with "who else is here", then the
        // self-facing announcement carrying its own secret.
        let members = self.store.snapshot(conn);
        self.router.deliver(
            Audience::Requester(conn),
            ServerMessage::JoinResult {
                status: true,
                members: Some(members),
                message: None,
            },
        );
        self.router.deliver(
            Audience::Requester(conn),
            ServerMessage::MemberJoin {
                who: MemberRef::Secret(credential),
                avatar,
                pos,
            },
        );
        // Everyone else learns the public projection only.
        self.router.deliver(
            Audience::Others(conn),
            ServerMessage::MemberJoin {
                who: MemberRef::Public(public_id),
                avatar,
                pos,
            },
        );
    }

    fn handle_move(&mut self, conn: ConnectionId, token: &Credential, key: u32) {
        if !self.store.credential_matches(conn, token) {
            tracing::debug!(%conn, "move rejected: credential mismatch");
            self.reject_move(conn);
            return;
        }

        let Some((credential, public_id, current)) =
            self.store.get(conn).and_then(|record| {
                Some((
                    record.credential.clone(),
                    record.public_id,
                    record.pos?,
                ))
            })
        else {
            // Registered but not joined: same reply shape as a bad
            // credential.
            tracing::debug!(%conn, "move rejected: not joined");
            self.reject_move(conn);
            return;
        };

        let next = apply_move(current, key, &self.config);
        if let Err(e) = self.store.update_position(conn, next) {
            tracing::debug!(%conn, error = %e, "move rejected");
            self.reject_move(conn);
            return;
        }

        tracing::trace!(%conn, %public_id, key, from = %current, to = %next, "move");

        self.router.deliver(
            Audience::Requester(conn),
            ServerMessage::MemberMove {
                who: MemberRef::Secret(credential),
                pos: next,
            },
        );
        self.router.deliver(
            Audience::Others(conn),
            ServerMessage::MemberMove {
                who: MemberRef::Public(public_id),
                pos: next,
            },
        );
    }

    fn handle_disconnect(&mut self, conn: ConnectionId) {
        // Announce first — the payload only needs the already-known
        // public id. A second disconnect for the same id finds no
        // record and does nothing.
        if let Some(record) = self.store.get(conn) {
            self.router.deliver(
                Audience::Others(conn),
                ServerMessage::MemberQuit {
                    who: record.public_id,
                },
            );
        }

        // Removal is the final step, so no command processed after this
        // point can observe a half-removed record.
        self.router.remove(conn);
        self.store.remove(conn);
    }

    fn reject_join(&self, conn: ConnectionId) {
        self.router.deliver(
            Audience::Requester(conn),
            ServerMessage::JoinResult {
                status: false,
                members: None,
                message: Some(REJECT_MESSAGE.into()),
            },
        );
    }

    fn reject_move(&self, conn: ConnectionId) {
        self.router.deliver(
            Audience::Requester(conn),
            ServerMessage::MoveResult {
                status: false,
                message: REJECT_MESSAGE.into(),
            },
        );
    }
}

/// Spawns the field actor task and returns a handle to it.
///
/// The actor owns a fresh [`MemberStore`] built around `issuer`; it runs
/// until every [`FieldHandle`] clone is dropped.
pub fn spawn_field(config: FieldConfig, issuer: TokenIssuer) -> FieldHandle {
    let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_SIZE);

    let actor = FieldActor {
        store: MemberStore::new(issuer),
        router: BroadcastRouter::new(),
        config,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    FieldHandle { sender: tx }
}
