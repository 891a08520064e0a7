//! Shared message model and codecs for the canvas WebSocket protocol.
//!
//! This crate owns the wire representation used by the server, the replay
//! engine and the CLI. JSON text frames are the canonical encoding; a compact
//! protobuf encoding is available for binary frames.
//!
//! | Direction | Tag | Payload |
//! |-----------|-----|---------|
//! | S→C | `INIT` | full ordered pixel sequence |
//! | C→S | `APPEND_PIXELS` | non-empty pixel batch |
//! | S→C | `NEW_PIXELS` | the appended pixels only |
//! | both | `CLEAR` | none |
//! | S→C | `ERROR` | `{ code, message }` |
//!
//! Decoding never panics. Every failure is a [`CodecError`], whose
//! [`ErrorCode`] is [`CODE_INVALID_MESSAGE`].

pub mod json;
pub mod proto;

pub use json::{decode_client_text, decode_server_text, encode_client_text, encode_server_text};
pub use proto::{decode_client_binary, decode_server_binary, encode_client_binary, encode_server_binary};

use serde::{Deserialize, Serialize};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Version stamped on every outbound message.
pub const PROTOCOL_VERSION: u32 = 1;

/// Brush radius used when a pixel carries none.
pub const DEFAULT_RADIUS: f64 = 10.0;

pub const TAG_INIT: &str = "INIT";
pub const TAG_APPEND_PIXELS: &str = "APPEND_PIXELS";
pub const TAG_NEW_PIXELS: &str = "NEW_PIXELS";
pub const TAG_CLEAR: &str = "CLEAR";
pub const TAG_ERROR: &str = "ERROR";

/// Error code sent back for any frame that fails to decode or validate.
pub const CODE_INVALID_MESSAGE: &str = "INVALID_MESSAGE";

/// Error code for failures that are the server's fault, not the client's.
pub const CODE_INTERNAL: &str = "INTERNAL";

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code and retryable flag for `ERROR` messages.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Error returned by every decode function in this crate.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame must be a json object")]
    NotAnObject,
    #[error("missing `type` tag")]
    MissingType,
    #[error("unknown message type: {0}")]
    UnknownType(String),
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u64),
    #[error("protocol version must be an unsigned integer, got {0}")]
    InvalidVersion(String),
    #[error("{tag} requires a payload")]
    MissingPayload { tag: &'static str },
    #[error("invalid {tag} payload: {source}")]
    InvalidPayload {
        tag: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{tag} payload must contain at least one pixel")]
    EmptyBatch { tag: &'static str },
    #[error("pixel {index}: {reason}")]
    InvalidPixel { index: usize, reason: &'static str },
    #[error("failed to decode protobuf message: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("invalid message kind: {0}")]
    InvalidKind(i32),
}

impl ErrorCode for CodecError {
    fn error_code(&self) -> &'static str {
        CODE_INVALID_MESSAGE
    }
}

// =============================================================================
// PIXEL
// =============================================================================

/// A drawn point. Immutable once stored; identity is its position in the
/// append-ordered sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pixel {
    pub x: f64,
    pub y: f64,
    /// CSS color specification, e.g. `#000000` or `rebeccapurple`.
    pub color: String,
    /// Brush radius. Older clients send this as `sizeCircle`.
    #[serde(default, alias = "sizeCircle", skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

impl Pixel {
    pub fn new(x: f64, y: f64, color: impl Into<String>) -> Self {
        Self { x, y, color: color.into(), radius: None }
    }

    #[must_use]
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    /// Radius to paint with, falling back to [`DEFAULT_RADIUS`].
    #[must_use]
    pub fn radius_or_default(&self) -> f64 {
        self.radius.unwrap_or(DEFAULT_RADIUS)
    }

    /// Check the numeric domains and the color string.
    ///
    /// # Errors
    ///
    /// Returns the reason the pixel is not well-formed.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err("coordinates must be finite");
        }
        if self.x < 0.0 || self.y < 0.0 {
            return Err("coordinates must be non-negative");
        }
        if self.color.trim().is_empty() {
            return Err("color must not be empty");
        }
        if let Some(radius) = self.radius {
            if !radius.is_finite() || radius <= 0.0 {
                return Err("radius must be a positive number");
            }
        }
        Ok(())
    }
}

/// Validate a batch, reporting the first bad pixel by index.
///
/// # Errors
///
/// Returns [`CodecError::EmptyBatch`] when `require_non_empty` is set and the
/// batch is empty, or [`CodecError::InvalidPixel`] for the first bad entry.
pub fn validate_pixels(tag: &'static str, pixels: &[Pixel], require_non_empty: bool) -> Result<(), CodecError> {
    if require_non_empty && pixels.is_empty() {
        return Err(CodecError::EmptyBatch { tag });
    }
    for (index, pixel) in pixels.iter().enumerate() {
        pixel
            .validate()
            .map_err(|reason| CodecError::InvalidPixel { index, reason })?;
    }
    Ok(())
}

// =============================================================================
// MESSAGES
// =============================================================================

/// Messages a client sends to the server.
#[derive(Clone, Debug, PartialEq)]
pub enum ClientMessage {
    /// Non-empty, except when decoded from the legacy `CREATE_PIXELS_ARRAY`,
    /// which older clients sent with no pixels on every plain click.
    AppendPixels(Vec<Pixel>),
    Clear,
}

impl ClientMessage {
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::AppendPixels(_) => TAG_APPEND_PIXELS,
            Self::Clear => TAG_CLEAR,
        }
    }
}

/// Messages the server sends to a client.
#[derive(Clone, Debug, PartialEq)]
pub enum ServerMessage {
    /// Full snapshot; the only time a client sees the whole canvas.
    Init(Vec<Pixel>),
    /// Pixels appended by one client message, never including earlier ones.
    NewPixels(Vec<Pixel>),
    Clear,
    /// Sent to the originating connection only.
    Error { code: String, message: String },
}

impl ServerMessage {
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Init(_) => TAG_INIT,
            Self::NewPixels(_) => TAG_NEW_PIXELS,
            Self::Clear => TAG_CLEAR,
            Self::Error { .. } => TAG_ERROR,
        }
    }

    /// Build an `ERROR` message from a typed error.
    #[must_use]
    pub fn error_from(err: &(impl ErrorCode + ?Sized)) -> Self {
        Self::Error { code: err.error_code().to_owned(), message: err.to_string() }
    }

    /// Number of pixels carried, for logging.
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        match self {
            Self::Init(pixels) | Self::NewPixels(pixels) => pixels.len(),
            Self::Clear | Self::Error { .. } => 0,
        }
    }
}

/// Wire encoding negotiated per connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Encoding {
    /// JSON text frames.
    #[default]
    Json,
    /// Protobuf binary frames.
    Binary,
}

impl Encoding {
    /// Parse the `encoding` query value. Unknown values fall back to JSON.
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("binary" | "proto" | "protobuf") => Self::Binary,
            _ => Self::Json,
        }
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
