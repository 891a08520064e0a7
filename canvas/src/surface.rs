//! Drawing surfaces.
//!
//! A [`Surface`] receives exactly two callbacks: erase everything, or paint
//! one pixel as a filled disc. The engine never reads a surface back, so a
//! surface may be a browser canvas, an in-memory grid, or just a log.

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use frames::Pixel;

/// Rendering callbacks driven by the replay engine.
pub trait Surface {
    /// Erase the whole drawing area.
    fn clear(&mut self);

    /// Paint one pixel: a disc of `pixel.radius_or_default()` in `pixel.color`.
    fn paint(&mut self, pixel: &Pixel);
}

// =============================================================
// Recording
// =============================================================

/// One call received by a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Clear,
    Paint(Pixel),
}

/// Surface that only logs the calls it receives.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    ops: Vec<SurfaceOp>,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Pixels painted since the last clear, in paint order.
    #[must_use]
    pub fn visible(&self) -> Vec<&Pixel> {
        let start = self
            .ops
            .iter()
            .rposition(|op| *op == SurfaceOp::Clear)
            .map_or(0, |i| i + 1);
        self.ops[start..]
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::Paint(pixel) => Some(pixel),
                SurfaceOp::Clear => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self) {
        self.ops.push(SurfaceOp::Clear);
    }

    fn paint(&mut self, pixel: &Pixel) {
        self.ops.push(SurfaceOp::Paint(pixel.clone()));
    }
}

// =============================================================
// Raster
// =============================================================

/// In-memory colour grid with the browser's disc semantics.
///
/// A cell is covered when its centre lies within the disc. Later paints
/// overwrite earlier ones, so two rasters fed the same pixel sequence are
/// equal cell for cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    /// Index into `palette` per cell, row-major.
    cells: Vec<Option<usize>>,
    palette: Vec<String>,
}

impl Raster {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self { width, height, cells: vec![None; len], palette: Vec::new() }
    }

    /// Raster with every pixel painted in order.
    #[must_use]
    pub fn from_pixels(width: u32, height: u32, pixels: &[Pixel]) -> Self {
        let mut raster = Self::new(width, height);
        for pixel in pixels {
            raster.paint(pixel);
        }
        raster
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Colour of the cell at `(x, y)`, or `None` if blank or out of bounds.
    #[must_use]
    pub fn color_at(&self, x: u32, y: u32) -> Option<&str> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = self.cells[self.index(x, y)]?;
        self.palette.get(index).map(String::as_str)
    }

    /// Number of non-blank cells.
    #[must_use]
    pub fn painted_cells(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn palette_index(&mut self, color: &str) -> usize {
        if let Some(i) = self.palette.iter().position(|c| c == color) {
            return i;
        }
        self.palette.push(color.to_owned());
        self.palette.len() - 1
    }

    /// Inclusive cell range covered by `[center - radius, center + radius]`,
    /// clamped to `0..limit`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn span(center: f64, radius: f64, limit: u32) -> Option<(u32, u32)> {
        if limit == 0 {
            return None;
        }
        let lo = (center - radius).floor().max(0.0);
        let hi = (center + radius).ceil().min(f64::from(limit - 1));
        if lo > hi {
            return None;
        }
        Some((lo as u32, hi as u32))
    }
}

impl Surface for Raster {
    fn clear(&mut self) {
        self.cells.fill(None);
        self.palette.clear();
    }

    fn paint(&mut self, pixel: &Pixel) {
        let radius = pixel.radius_or_default();
        let (Some((x0, x1)), Some((y0, y1))) = (
            Self::span(pixel.x, radius, self.width),
            Self::span(pixel.y, radius, self.height),
        ) else {
            return;
        };

        let color = self.palette_index(&pixel.color);
        let r2 = radius * radius;
        for cy in y0..=y1 {
            let dy = f64::from(cy) + 0.5 - pixel.y;
            for cx in x0..=x1 {
                let dx = f64::from(cx) + 0.5 - pixel.x;
                if dx * dx + dy * dy <= r2 {
                    let i = self.index(cx, cy);
                    self.cells[i] = Some(color);
                }
            }
        }
    }
}
