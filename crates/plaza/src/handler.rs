//! Per-connection handler: registration, event relay, and cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register with the field actor → credential event is pushed
//!   2. Spawn a writer task draining the outbound channel to the socket
//!   3. Loop: receive frames → decode → forward commands to the actor
//!   4. On exit (clean close, error, or panic) the guard reports the
//!      disconnect, which triggers the quit broadcast and store removal.

use std::sync::Arc;

use plaza_protocol::{ClientMessage, Codec, ServerMessage};
use plaza_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::PlazaError;

/// Drop guard that reports a connection's departure to the field actor.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async send.
/// The actor treats duplicate disconnects as no-ops, so firing this
/// after an explicit disconnect is harmless.
struct FieldGuard<C: Codec> {
    conn_id: ConnectionId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for FieldGuard<C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let _ = state.field.disconnect(conn_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), PlazaError>
where
    C: Codec + Clone,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: Register with the field ---
    //
    // The actor issues the credential and pushes the `token` event into
    // `event_tx` before `connect` returns, so the writer task (spawned
    // next) delivers it as the connection's first frame.
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let public_id = state.field.connect(conn_id, event_tx).await?;

    tracing::info!(%conn_id, %public_id, "connection registered");

    let _guard = FieldGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    // --- Step 2: Writer task ---
    //
    // Drains the outbound channel to the socket. Ends when the actor
    // drops the sender during disconnect cleanup, or when the socket
    // rejects a send because the peer is gone.
    let writer = tokio::spawn(run_writer(
        conn.clone(),
        event_rx,
        state.codec.clone(),
    ));

    // --- Step 3: Reader loop ---
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let msg: ClientMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(
                    %conn_id, error = %e, "failed to decode frame"
                );
                continue;
            }
        };

        match msg {
            ClientMessage::Join { token, avatar } => {
                state.field.join(conn_id, token, avatar).await?;
            }
            ClientMessage::Move { token, key } => {
                state.field.move_avatar(conn_id, token, key).await?;
            }
        }
    }

    // _guard drops here → disconnect fires → actor drops the outbound
    // sender → the writer task ends on its own.
    drop(_guard);
    let _ = writer.await;
    Ok(())
}

/// Encodes outbound events and writes them to the socket, in order.
async fn run_writer<C: Codec>(
    conn: WebSocketConnection,
    mut event_rx: mpsc::UnboundedReceiver<ServerMessage>,
    codec: C,
) {
    let conn_id = conn.id();
    while let Some(event) = event_rx.recv().await {
        let bytes = match codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(%conn_id, error = %e, "encode failed");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "send failed, writer exiting");
            break;
        }
    }
}
