//! Double-buffered pixel storage for the tick engine.
//!
//! This module provides the `GridStore` type which manages two pixel
//! buffers. Each tick reads the previous generation and writes every cell of
//! the current one, then the roles flip. A partially written generation is
//! never visible as the input of the same tick.

use mathmachine_common::{GridCoord, GridError, LevelError};
use tracing::info;

use crate::codec::Pixel;

/// Double-buffered grid of tile pixels.
///
/// The two buffers alternate roles between input (previous generation) and
/// output (current generation). This double-buffering ensures that:
///
/// 1. Every cell update reads a consistent previous generation
/// 2. Writes to the current generation never affect reads in the same tick
/// 3. Placements land in the buffer the next tick will read
///
/// # Example
///
/// ```
/// use mathmachine_kernel::buffer::GridStore;
/// use mathmachine_kernel::codec::Pixel;
///
/// let mut store = GridStore::new(16, 16, Pixel::EMPTY);
/// let (previous, current) = store.begin_generation();
/// current.copy_from_slice(previous);
/// assert_eq!(store.cell_count(), 256);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridStore {
    /// Generation visible to readers and placements
    current: Vec<Pixel>,
    /// Generation the next tick reads from
    previous: Vec<Pixel>,
    /// Grid width in cells
    width: u32,
    /// Grid height in cells
    height: u32,
}

impl GridStore {
    /// Creates a grid with every cell set to `fill`.
    ///
    /// # Panics
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub fn new(width: u32, height: u32, fill: Pixel) -> Self {
        assert!(width > 0 && height > 0, "grid must not be empty");
        info!(
            "Creating double-buffered grid ({}x{} = {} cells)",
            width,
            height,
            width as usize * height as usize
        );

        let cell_count = width as usize * height as usize;
        Self {
            current: vec![fill; cell_count],
            previous: vec![fill; cell_count],
            width,
            height,
        }
    }

    /// Creates a grid from existing pixel data.
    ///
    /// Both generations start as a copy of `pixels`.
    pub fn with_pixels(width: u32, height: u32, pixels: Vec<Pixel>) -> Result<Self, LevelError> {
        if width == 0 || height == 0 {
            return Err(LevelError::Malformed(format!(
                "dimensions must be positive, got {width}x{height}"
            )));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| LevelError::Malformed("grid dimensions overflow".to_string()))?;
        if pixels.len() != expected {
            return Err(LevelError::Malformed(format!(
                "expected {expected} cells, got {}",
                pixels.len()
            )));
        }

        Ok(Self {
            previous: pixels.clone(),
            current: pixels,
            width,
            height,
        })
    }

    /// Starts a new generation.
    ///
    /// The current generation becomes the previous one and the returned
    /// output slice must be fully overwritten by the caller.
    pub fn begin_generation(&mut self) -> (&[Pixel], &mut [Pixel]) {
        std::mem::swap(&mut self.current, &mut self.previous);
        (&self.previous, &mut self.current)
    }

    /// Pixels of the current generation, row-major.
    #[must_use]
    pub fn current(&self) -> &[Pixel] {
        &self.current
    }

    /// Pixels of the previous generation, row-major.
    #[must_use]
    pub fn previous(&self) -> &[Pixel] {
        &self.previous
    }

    /// Current generation as raw bytes, ready for a texture upload.
    #[must_use]
    pub fn current_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.current)
    }

    /// Reads a pixel of the current generation.
    pub fn pixel(&self, coord: GridCoord) -> Result<Pixel, GridError> {
        let index = self.index_of(coord)?;
        Ok(self.current[index])
    }

    /// Writes a pixel into the current generation.
    pub fn set_pixel(&mut self, coord: GridCoord, pixel: Pixel) -> Result<(), GridError> {
        let index = self.index_of(coord)?;
        self.current[index] = pixel;
        Ok(())
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.current.len()
    }

    fn index_of(&self, coord: GridCoord) -> Result<usize, GridError> {
        coord
            .to_index(self.width, self.height)
            .ok_or(GridError::OutOfBounds {
                x: coord.x,
                y: coord.y,
                width: self.width,
                height: self.height,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_swap() {
        let mut store = GridStore::new(2, 2, Pixel::EMPTY);
        let marked = Pixel::new(1, 2, 3, 4);
        store
            .set_pixel(GridCoord::new(1, 1), marked)
            .expect("in bounds");

        let (previous, current) = store.begin_generation();
        // The placement is now the input of the tick.
        assert_eq!(previous[3], marked);
        current.fill(Pixel::EMPTY);

        assert_eq!(store.previous()[3], marked);
        assert_eq!(store.current()[3], Pixel::EMPTY);
    }

    #[test]
    fn test_out_of_bounds_access() {
        let mut store = GridStore::new(4, 3, Pixel::EMPTY);
        assert!(matches!(
            store.pixel(GridCoord::new(4, 0)),
            Err(GridError::OutOfBounds { x: 4, y: 0, .. })
        ));
        assert!(store
            .set_pixel(GridCoord::new(0, -1), Pixel::EMPTY)
            .is_err());
        assert!(store.pixel(GridCoord::new(3, 2)).is_ok());
    }

    #[test]
    fn test_with_pixels_validates_length() {
        assert!(GridStore::with_pixels(2, 2, vec![Pixel::EMPTY; 3]).is_err());
        assert!(GridStore::with_pixels(0, 2, Vec::new()).is_err());

        let store = GridStore::with_pixels(2, 2, vec![Pixel::new(9, 0, 0, 0); 4])
            .expect("valid grid");
        assert_eq!(store.current(), store.previous());
    }

    #[test]
    fn test_buffer_byte_size() {
        let store = GridStore::new(16, 16, Pixel::EMPTY);
        // 16 * 16 cells * 16 bytes
        assert_eq!(store.current_bytes().len(), 4096);
    }
}
