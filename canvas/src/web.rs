//! Browser entry point.
//!
//! The host page owns the websocket: it forwards every inbound frame to
//! [`WebEngine::on_message`] or [`WebEngine::on_binary`], wires pointer events
//! to the pointer methods, and sends whatever string they return.

use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use crate::engine::{EchoPolicy, ReplayEngine, ReplayError};
use crate::render::CanvasSurface;

fn to_js(err: ReplayError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

/// Replay engine bound to a browser canvas.
#[wasm_bindgen]
pub struct WebEngine {
    engine: ReplayEngine<CanvasSurface>,
}

#[wasm_bindgen]
impl WebEngine {
    /// `server_echoes` must match the server's sender-inclusion setting.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the canvas has no 2D context.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: &HtmlCanvasElement, server_echoes: bool) -> Result<WebEngine, JsValue> {
        let surface = CanvasSurface::from_canvas(canvas)?;
        let echo = if server_echoes { EchoPolicy::ServerEchoes } else { EchoPolicy::LocalOnly };
        Ok(Self { engine: ReplayEngine::with_echo_policy(surface, echo) })
    }

    /// # Errors
    ///
    /// Returns `Err` for a frame that does not decode; nothing is drawn.
    pub fn on_message(&mut self, text: &str) -> Result<(), JsValue> {
        self.engine.apply_text(text).map_err(to_js)
    }

    /// # Errors
    ///
    /// Returns `Err` for a frame that does not decode; nothing is drawn.
    pub fn on_binary(&mut self, bytes: &[u8]) -> Result<(), JsValue> {
        self.engine.apply_binary(bytes).map_err(to_js)
    }

    pub fn pointer_down(&mut self) {
        self.engine.pointer_down();
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.engine.pointer_move(x, y)
    }

    /// Frame to send for the finished stroke, if any.
    pub fn pointer_up(&mut self) -> Option<String> {
        let message = self.engine.pointer_up()?;
        Some(self.engine.send_mutation(&message))
    }

    /// Frame to send for a clear request.
    pub fn request_clear(&mut self) -> String {
        let message = self.engine.request_clear();
        self.engine.send_mutation(&message)
    }

    /// # Errors
    ///
    /// Returns `Err` for an empty colour.
    pub fn set_color(&mut self, color: &str) -> Result<(), JsValue> {
        self.engine.brush_mut().set_color(color).map_err(to_js)
    }

    /// # Errors
    ///
    /// Returns `Err` unless the radius is finite and positive.
    pub fn set_radius(&mut self, radius: f64) -> Result<(), JsValue> {
        self.engine.brush_mut().set_radius(radius).map_err(to_js)
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.engine.surface_mut().resize(width, height);
    }

    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.engine.pixels().len()
    }

    #[must_use]
    pub fn is_synced(&self) -> bool {
        self.engine.is_synced()
    }

    /// Last `ERROR` from the server, as `"CODE: message"`.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.engine
            .last_error()
            .map(|err| format!("{}: {}", err.code, err.message))
    }
}
