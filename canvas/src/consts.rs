//! Shared constants for the canvas crate.

// ── Brush ───────────────────────────────────────────────────────

/// Colour of a fresh brush.
pub const DEFAULT_COLOR: &str = "#000000";

// ── Surface ─────────────────────────────────────────────────────

/// Default drawing area width in CSS pixels.
pub const DEFAULT_WIDTH: u32 = 500;

/// Default drawing area height in CSS pixels.
pub const DEFAULT_HEIGHT: u32 = 500;
