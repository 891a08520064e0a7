use frames::{ClientMessage, CodecError, DEFAULT_RADIUS, Pixel, ServerMessage};

use crate::consts::DEFAULT_COLOR;
use crate::surface::Surface;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Errors surfaced to the host by the replay engine.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("server message decode failed: {0}")]
    Decode(#[from] CodecError),
    #[error("invalid brush: {0}")]
    InvalidBrush(&'static str),
}

/// An `ERROR` message received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub code: String,
    pub message: String,
}

/// Whether the server echoes a client's own mutations back to it.
///
/// Must match the server's sender-inclusion setting, otherwise the mirror
/// either misses the client's own strokes or records them twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EchoPolicy {
    /// The sender receives its own `NEW_PIXELS` and `CLEAR`.
    #[default]
    ServerEchoes,
    /// The server skips the sender; the engine records its own mutations.
    LocalOnly,
}

/// Colour and disc radius applied to captured pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    color: String,
    radius: f64,
}

impl Default for Brush {
    fn default() -> Self {
        Self { color: DEFAULT_COLOR.to_owned(), radius: DEFAULT_RADIUS }
    }
}

impl Brush {
    #[must_use]
    pub fn color(&self) -> &str {
        &self.color
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// # Errors
    ///
    /// Rejects an empty colour; the brush is unchanged.
    pub fn set_color(&mut self, color: impl Into<String>) -> Result<(), ReplayError> {
        let color = color.into();
        if color.trim().is_empty() {
            return Err(ReplayError::InvalidBrush("color must not be empty"));
        }
        self.color = color;
        Ok(())
    }

    /// # Errors
    ///
    /// Rejects a radius that is not finite and positive; the brush is unchanged.
    pub fn set_radius(&mut self, radius: f64) -> Result<(), ReplayError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ReplayError::InvalidBrush("radius must be finite and positive"));
        }
        self.radius = radius;
        Ok(())
    }

    fn pixel_at(&self, x: f64, y: f64) -> Pixel {
        Pixel::new(x, y, self.color.clone()).with_radius(self.radius)
    }
}

/// Replays the server's message stream onto a [`Surface`].
///
/// Separated from the browser wrapper so it can be tested and reused natively.
pub struct ReplayEngine<S> {
    surface: S,
    /// Pixel sequence built from server messages.
    mirror: Vec<Pixel>,
    brush: Brush,
    echo: EchoPolicy,
    /// Pixels captured since pointer-down; `None` while the pointer is up.
    stroke: Option<Vec<Pixel>>,
    synced: bool,
    last_error: Option<RemoteError>,
}

impl<S: Surface> ReplayEngine<S> {
    #[must_use]
    pub fn new(surface: S) -> Self {
        Self::with_echo_policy(surface, EchoPolicy::default())
    }

    #[must_use]
    pub fn with_echo_policy(surface: S, echo: EchoPolicy) -> Self {
        Self {
            surface,
            mirror: Vec::new(),
            brush: Brush::default(),
            echo,
            stroke: None,
            synced: false,
            last_error: None,
        }
    }

    // --- Server messages ---

    /// Apply one decoded server message.
    pub fn apply(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Init(pixels) => {
                self.surface.clear();
                for pixel in &pixels {
                    self.surface.paint(pixel);
                }
                self.mirror = pixels;
                self.synced = true;
            }
            ServerMessage::NewPixels(pixels) => {
                for pixel in &pixels {
                    self.surface.paint(pixel);
                }
                self.mirror.extend(pixels);
            }
            ServerMessage::Clear => self.erase(),
            ServerMessage::Error { code, message } => {
                self.last_error = Some(RemoteError { code, message });
            }
        }
    }

    /// Decode a JSON text frame and apply it.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Decode`]; the surface and mirror are untouched.
    pub fn apply_text(&mut self, text: &str) -> Result<(), ReplayError> {
        let message = frames::decode_server_text(text)?;
        self.apply(message);
        Ok(())
    }

    /// Decode a binary frame and apply it.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Decode`]; the surface and mirror are untouched.
    pub fn apply_binary(&mut self, bytes: &[u8]) -> Result<(), ReplayError> {
        let message = frames::decode_server_binary(bytes)?;
        self.apply(message);
        Ok(())
    }

    // --- Stroke capture ---

    /// Start a stroke. Nothing is painted until the pointer moves.
    pub fn pointer_down(&mut self) {
        self.stroke = Some(Vec::new());
    }

    /// Paint at `(x, y)` with the current brush if a stroke is active.
    ///
    /// Returns whether a pixel was captured. Points the server would reject
    /// (negative or non-finite coordinates) are skipped.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        let Some(stroke) = self.stroke.as_mut() else {
            return false;
        };
        let pixel = self.brush.pixel_at(x, y);
        if pixel.validate().is_err() {
            return false;
        }
        self.surface.paint(&pixel);
        stroke.push(pixel);
        true
    }

    /// End the stroke and return the message to send, if anything was drawn.
    pub fn pointer_up(&mut self) -> Option<ClientMessage> {
        let stroke = self.stroke.take()?;
        if stroke.is_empty() {
            return None;
        }
        if self.echo == EchoPolicy::LocalOnly {
            self.mirror.extend(stroke.iter().cloned());
        }
        Some(ClientMessage::AppendPixels(stroke))
    }

    /// Whether a stroke is in progress.
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.stroke.is_some()
    }

    /// Build a `CLEAR` request.
    ///
    /// With [`EchoPolicy::LocalOnly`] the engine erases immediately, since no
    /// `CLEAR` will come back.
    pub fn request_clear(&mut self) -> ClientMessage {
        if self.echo == EchoPolicy::LocalOnly {
            self.erase();
        }
        ClientMessage::Clear
    }

    /// Encode an outbound message as a JSON text frame for the host transport.
    #[must_use]
    pub fn send_mutation(&self, message: &ClientMessage) -> String {
        frames::encode_client_text(message)
    }

    // --- Brush ---

    #[must_use]
    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn brush_mut(&mut self) -> &mut Brush {
        &mut self.brush
    }

    // --- Queries ---

    /// The pixel sequence as the server has described it.
    #[must_use]
    pub fn pixels(&self) -> &[Pixel] {
        &self.mirror
    }

    /// Whether `INIT` has been received.
    #[must_use]
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&RemoteError> {
        self.last_error.as_ref()
    }

    #[must_use]
    pub fn echo_policy(&self) -> EchoPolicy {
        self.echo
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    #[must_use]
    pub fn into_surface(self) -> S {
        self.surface
    }

    fn erase(&mut self) {
        self.surface.clear();
        self.mirror.clear();
    }
}
