//! Rendering: paints pixels onto a browser 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! Each pixel is a filled disc (`arc` + `fill`) in the pixel's colour.

use std::f64::consts::TAU;

use frames::Pixel;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::surface::Surface;

/// [`Surface`] backed by a canvas element's 2D context.
pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
    width: f64,
    height: f64,
    /// Paint calls the context refused.
    failed_paints: usize,
}

impl CanvasSurface {
    #[must_use]
    pub fn new(ctx: CanvasRenderingContext2d, width: f64, height: f64) -> Self {
        Self { ctx, width, height, failed_paints: 0 }
    }

    /// Acquire the element's 2D context, sized to the element.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the element has no 2D context.
    pub fn from_canvas(canvas: &HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self::new(ctx, f64::from(canvas.width()), f64::from(canvas.height())))
    }

    /// Track a resized element so `clear` covers all of it.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    #[must_use]
    pub fn failed_paints(&self) -> usize {
        self.failed_paints
    }
}

impl Surface for CanvasSurface {
    fn clear(&mut self) {
        self.ctx.clear_rect(0.0, 0.0, self.width, self.height);
    }

    fn paint(&mut self, pixel: &Pixel) {
        self.ctx.set_fill_style_str(&pixel.color);
        self.ctx.begin_path();
        if self
            .ctx
            .arc(pixel.x, pixel.y, pixel.radius_or_default(), 0.0, TAU)
            .is_err()
        {
            self.failed_paints += 1;
            return;
        }
        self.ctx.fill();
    }
}
