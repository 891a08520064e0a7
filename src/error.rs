//! Server-side error taxonomy.
//!
//! Protocol errors live in `frames::CodecError`. The two kinds here never
//! leave the connection they happened on: a `TransportError` drops that
//! connection from the registry, and an `InternalError` fails only the
//! request that triggered it.

use std::collections::TryReserveError;

use frames::{CODE_INTERNAL, ErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("websocket send failed: {0}")]
    Send(#[source] axum::Error),
    #[error("websocket receive failed: {0}")]
    Receive(#[source] axum::Error),
    #[error("connection queue is closed")]
    QueueClosed,
}

#[derive(Debug, thiserror::Error)]
pub enum InternalError {
    #[error("pixel store cannot grow by {requested} pixels: {source}")]
    StoreCapacity {
        requested: usize,
        #[source]
        source: TryReserveError,
    },
}

impl ErrorCode for InternalError {
    fn error_code(&self) -> &'static str {
        CODE_INTERNAL
    }

    fn retryable(&self) -> bool {
        true
    }
}
