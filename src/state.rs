//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is constructed once at startup and injected into Axum handlers
//! via the `State` extractor. It owns the single `CanvasState`: the pixel
//! store and the connection registry, kept behind one lock so that a
//! mutation and its fanout, or a registration and its INIT snapshot, are a
//! single atomic step.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::Config;
use crate::registry::ConnectionRegistry;
use crate::store::PixelStore;

// =============================================================================
// CANVAS STATE
// =============================================================================

/// The shared canvas: authoritative pixels plus everyone watching them.
#[derive(Debug, Default)]
pub struct CanvasState {
    pub pixels: PixelStore,
    pub clients: ConnectionRegistry,
}

impl CanvasState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Clone is required by Axum — all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub canvas: Arc<RwLock<CanvasState>>,
    pub config: Arc<Config>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { canvas: Arc::new(RwLock::new(CanvasState::new())), config: Arc::new(config) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
