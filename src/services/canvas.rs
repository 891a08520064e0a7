//! Canvas service — join/part, store mutations, and broadcast fanout.
//!
//! DESIGN
//! ======
//! Every operation that touches both the store and the registry runs under
//! the canvas write lock. Fanout uses `try_send`, so holding the lock never
//! waits on a slow peer, and each connection's queue receives messages in
//! exactly the order the store was mutated.
//!
//! ERROR HANDLING
//! ==============
//! A delivery failure (queue closed or full) evicts that connection and is
//! reported in the `FanoutReport`; it never stops delivery to the others.
//! A lagging peer is evicted rather than skipped so it cannot silently drift
//! from the authoritative sequence.

use frames::{Pixel, ServerMessage};
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use crate::error::{InternalError, TransportError};
use crate::registry::{ClientSender, ConnectionId, ConnectionRegistry};
use crate::state::AppState;

// =============================================================================
// TYPES
// =============================================================================

/// A store mutation requested by a client.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Append(Vec<Pixel>),
    Clear,
}

/// What happened during one fanout.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FanoutReport {
    pub delivered: usize,
    /// Connections whose delivery failed; they have been removed.
    pub evicted: Vec<ConnectionId>,
}

// =============================================================================
// JOIN / PART
// =============================================================================

/// Register a connection and queue its INIT snapshot.
///
/// The snapshot and the registration happen under one write lock, and INIT
/// is queued before any broadcast can reach the new queue. Returns the
/// number of pixels in the snapshot.
///
/// # Errors
///
/// Returns [`TransportError::QueueClosed`] if the receiver is already gone;
/// the connection is not registered in that case.
pub async fn join(state: &AppState, client_id: ConnectionId, tx: ClientSender) -> Result<usize, TransportError> {
    let mut canvas = state.canvas.write().await;

    let snapshot = canvas.pixels.snapshot();
    let count = snapshot.len();
    tx.try_send(ServerMessage::Init(snapshot))
        .map_err(|_| TransportError::QueueClosed)?;

    canvas.clients.add(client_id, tx);
    info!(%client_id, pixels = count, clients = canvas.clients.len(), "client joined canvas");
    Ok(count)
}

/// Remove a connection. Safe to call more than once.
pub async fn part(state: &AppState, client_id: ConnectionId) -> bool {
    let mut canvas = state.canvas.write().await;
    let removed = canvas.clients.remove(&client_id);
    if removed {
        info!(%client_id, remaining = canvas.clients.len(), "client left canvas");
    }
    removed
}

/// Full ordered copy of the canvas.
pub async fn snapshot(state: &AppState) -> Vec<Pixel> {
    state.canvas.read().await.pixels.snapshot()
}

// =============================================================================
// MUTATIONS
// =============================================================================

/// Apply a mutation and fan the resulting delta out, as one atomic step.
///
/// `NEW_PIXELS` carries exactly the pixels this mutation appended. The
/// sender is included unless the config says otherwise.
///
/// # Errors
///
/// Returns an [`InternalError`] if the store cannot grow. Nothing is stored
/// or broadcast in that case.
pub async fn apply(
    state: &AppState,
    client_id: ConnectionId,
    mutation: Mutation,
) -> Result<FanoutReport, InternalError> {
    let exclude = if state.config.include_sender { None } else { Some(client_id) };

    let mut canvas = state.canvas.write().await;
    let canvas = &mut *canvas;

    let message = match mutation {
        Mutation::Append(pixels) => {
            let appended = canvas.pixels.append(pixels)?.to_vec();
            debug!(%client_id, count = appended.len(), total = canvas.pixels.len(), "pixels appended");
            ServerMessage::NewPixels(appended)
        }
        Mutation::Clear => {
            let dropped = canvas.pixels.clear();
            info!(%client_id, dropped, "canvas cleared");
            ServerMessage::Clear
        }
    };

    Ok(broadcast(&mut canvas.clients, &message, exclude))
}

// =============================================================================
// BROADCAST
// =============================================================================

/// Deliver a message to every registered connection, optionally excluding one.
///
/// Each delivery is attempted independently. Connections whose queue is
/// closed or full are removed from the registry and listed in the report.
pub fn broadcast(
    clients: &mut ConnectionRegistry,
    message: &ServerMessage,
    exclude: Option<ConnectionId>,
) -> FanoutReport {
    let mut report = FanoutReport::default();

    for (client_id, tx) in clients.all() {
        if exclude == Some(*client_id) {
            continue;
        }
        match tx.try_send(message.clone()) {
            Ok(()) => report.delivered += 1,
            Err(TrySendError::Full(_)) => {
                warn!(%client_id, tag = message.tag(), "fanout: client queue full, evicting");
                report.evicted.push(*client_id);
            }
            Err(TrySendError::Closed(_)) => {
                warn!(%client_id, tag = message.tag(), "fanout: client queue closed, evicting");
                report.evicted.push(*client_id);
            }
        }
    }

    for client_id in &report.evicted {
        clients.remove(client_id);
    }

    debug!(
        tag = message.tag(),
        delivered = report.delivered,
        evicted = report.evicted.len(),
        "fanout complete"
    );
    report
}

#[cfg(test)]
#[path = "canvas_test.rs"]
mod tests;
