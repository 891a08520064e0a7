//! Pixel store — the authoritative, append-ordered canvas content.
//!
//! The store itself is not synchronized; it lives inside
//! [`crate::state::CanvasState`] behind the canvas lock, which is what makes
//! `append` and `clear` atomic with respect to each other.

use frames::Pixel;

use crate::error::InternalError;

#[derive(Debug, Default)]
pub struct PixelStore {
    pixels: Vec<Pixel>,
}

impl PixelStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Point-in-time copy of the full ordered sequence.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Pixel> {
        self.pixels.clone()
    }

    /// Append a batch in order and return exactly the appended pixels.
    ///
    /// # Errors
    ///
    /// Returns [`InternalError::StoreCapacity`] if the sequence cannot grow.
    /// The store is unchanged in that case.
    pub fn append(&mut self, batch: Vec<Pixel>) -> Result<&[Pixel], InternalError> {
        let requested = batch.len();
        self.pixels
            .try_reserve(requested)
            .map_err(|source| InternalError::StoreCapacity { requested, source })?;

        let start = self.pixels.len();
        self.pixels.extend(batch);
        Ok(&self.pixels[start..])
    }

    /// Empty the sequence. Returns how many pixels were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pixels.len();
        self.pixels.clear();
        dropped
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Pixel] {
        &self.pixels
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
