//! WebSocket handler — canvas protocol relay.
//!
//! DESIGN
//! ======
//! On upgrade, registers the connection (queuing its INIT snapshot) and
//! enters a `select!` loop:
//! - Incoming client frames → decode + dispatch by message tag
//! - Queued server messages (INIT, broadcasts) → encode + forward to client
//!
//! Handler functions are pure and return an `Outcome`; decoding has already
//! validated the message. The dispatch layer owns all side effects: mutating
//! the canvas, fanning out the delta, and replying to the sender.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → `Connecting`
//! 2. Register + INIT queued under one lock → `Synced` → `AwaitingMessage`
//! 3. Client frame → `Applying` → Outcome applied → `AwaitingMessage`
//! 4. Close, transport error, or eviction → `Closed` → removed from registry

use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use frames::{ClientMessage, CodecError, Encoding, Pixel, ServerMessage};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::TransportError;
use crate::registry::ConnectionId;
use crate::services;
use crate::services::canvas::Mutation;
use crate::state::AppState;

// =============================================================================
// SESSION
// =============================================================================

/// Per-connection protocol phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Connecting,
    Synced,
    AwaitingMessage,
    Applying,
    Closed,
}

struct Session {
    client_id: ConnectionId,
    encoding: Encoding,
    phase: Phase,
}

impl Session {
    fn new(encoding: Encoding) -> Self {
        Self { client_id: Uuid::new_v4(), encoding, phase: Phase::Connecting }
    }

    fn transition(&mut self, next: Phase) {
        debug!(client_id = %self.client_id, from = ?self.phase, to = ?next, "ws: phase");
        self.phase = next;
    }
}

// =============================================================================
// OUTCOME
// =============================================================================

/// Result returned by handler functions. The dispatch layer uses this to
/// decide who receives what — handlers never touch the canvas or the socket.
#[derive(Debug, PartialEq)]
enum Outcome {
    /// Apply the mutation, then broadcast its delta per the sender policy.
    Broadcast(Mutation),
    /// Nothing to apply and nothing to send.
    Done,
}

/// One inbound websocket payload, before decoding.
#[derive(Debug)]
enum Inbound {
    Text(String),
    Binary(Vec<u8>),
}

impl Inbound {
    fn decode(&self) -> Result<ClientMessage, CodecError> {
        match self {
            Self::Text(text) => frames::decode_client_text(text),
            Self::Binary(bytes) => frames::decode_client_binary(bytes),
        }
    }
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    let encoding = Encoding::from_query(params.get("encoding").map(String::as_str));
    let limit = state.config.max_message_bytes;

    ws.max_message_size(limit)
        .on_upgrade(move |socket| run_ws(socket, state, encoding))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, encoding: Encoding) {
    let mut session = Session::new(encoding);
    let client_id = session.client_id;

    // Per-connection queue for INIT and broadcasts.
    let (client_tx, mut client_rx) = mpsc::channel::<ServerMessage>(state.config.client_queue_capacity);

    match services::canvas::join(&state, client_id, client_tx).await {
        Ok(pixels) => {
            session.transition(Phase::Synced);
            info!(%client_id, ?encoding, pixels, "ws: client connected");
        }
        Err(e) => {
            warn!(%client_id, error = %e, "ws: join failed");
            return;
        }
    }
    session.transition(Phase::AwaitingMessage);

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let msg = match msg {
                    Ok(msg) => msg,
                    Err(e) => {
                        debug!(%client_id, error = %TransportError::Receive(e), "ws: receive failed");
                        break;
                    }
                };
                let inbound = match msg {
                    Message::Text(text) => Inbound::Text(text.as_str().to_owned()),
                    Message::Binary(bytes) => Inbound::Binary(bytes.to_vec()),
                    Message::Close(_) => break,
                    _ => continue,
                };

                session.transition(Phase::Applying);
                let replies = process_inbound(&state, client_id, &inbound).await;
                if send_all(&mut socket, session.encoding, &replies).await.is_err() {
                    break;
                }
                session.transition(Phase::AwaitingMessage);
            }
            queued = client_rx.recv() => {
                // The registry dropped our sender: evicted as a lagging peer.
                let Some(message) = queued else {
                    warn!(%client_id, "ws: connection evicted from canvas");
                    break;
                };
                if send_message(&mut socket, session.encoding, &message).await.is_err() {
                    break;
                }
            }
        }
    }

    session.transition(Phase::Closed);
    services::canvas::part(&state, client_id).await;
    info!(%client_id, "ws: client disconnected");
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Decode and process one inbound frame, returning messages for the sender.
///
/// Broadcast deltas do not appear in the return value; they reach every
/// connection (the sender included, if configured) through its queue.
async fn process_inbound(state: &AppState, client_id: ConnectionId, inbound: &Inbound) -> Vec<ServerMessage> {
    let message = match inbound.decode() {
        Ok(message) => message,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound message");
            return vec![ServerMessage::error_from(&e)];
        }
    };

    debug!(%client_id, tag = message.tag(), "ws: recv message");

    match dispatch(message) {
        Outcome::Broadcast(mutation) => match services::canvas::apply(state, client_id, mutation).await {
            Ok(_) => vec![],
            Err(e) => {
                error!(%client_id, error = %e, "ws: mutation failed");
                vec![ServerMessage::error_from(&e)]
            }
        },
        Outcome::Done => vec![],
    }
}

/// Handler table keyed by message variant.
fn dispatch(message: ClientMessage) -> Outcome {
    match message {
        ClientMessage::AppendPixels(pixels) => handle_append_pixels(pixels),
        ClientMessage::Clear => handle_clear(),
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

fn handle_append_pixels(pixels: Vec<Pixel>) -> Outcome {
    // Only the legacy batch tag decodes empty.
    if pixels.is_empty() {
        return Outcome::Done;
    }
    Outcome::Broadcast(Mutation::Append(pixels))
}

fn handle_clear() -> Outcome {
    Outcome::Broadcast(Mutation::Clear)
}

// =============================================================================
// HELPERS
// =============================================================================

fn encode_outbound(encoding: Encoding, message: &ServerMessage) -> Message {
    match encoding {
        Encoding::Json => Message::Text(frames::encode_server_text(message).into()),
        Encoding::Binary => Message::Binary(frames::encode_server_binary(message).into()),
    }
}

async fn send_message(socket: &mut WebSocket, encoding: Encoding, message: &ServerMessage) -> Result<(), TransportError> {
    if let ServerMessage::Error { code, message: text } = message {
        warn!(code = %code, message = %text, "ws: send ERROR");
    } else {
        debug!(tag = message.tag(), pixels = message.pixel_count(), "ws: send message");
    }

    let result = socket
        .send(encode_outbound(encoding, message))
        .await
        .map_err(TransportError::Send);
    if let Err(e) = &result {
        debug!(error = %e, "ws: send failed");
    }
    result
}

async fn send_all(socket: &mut WebSocket, encoding: Encoding, messages: &[ServerMessage]) -> Result<(), TransportError> {
    for message in messages {
        send_message(socket, encoding, message).await?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
