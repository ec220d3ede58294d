//! Grid coordinates.
//!
//! Coordinates are signed so that neighbour lookups can step outside the
//! grid; anything outside `[0, width) x [0, height)` simply has no index.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// A cell position on the level grid.
///
/// `(0, 0)` is the first cell of the row-major pixel data; `y` grows with
/// the row index.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Pod, Zeroable,
)]
#[repr(C)]
pub struct GridCoord {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns this coordinate moved by `(dx, dy)` scaled by `steps`.
    #[must_use]
    pub const fn step(self, dx: i32, dy: i32, steps: i32) -> Self {
        Self {
            x: self.x.wrapping_add(dx.wrapping_mul(steps)),
            y: self.y.wrapping_add(dy.wrapping_mul(steps)),
        }
    }

    /// Returns whether the coordinate lies inside a `width x height` grid.
    #[must_use]
    pub const fn in_bounds(self, width: u32, height: u32) -> bool {
        self.x >= 0 && self.y >= 0 && (self.x as u32) < width && (self.y as u32) < height
    }

    /// Converts to a row-major linear index, or `None` when out of bounds.
    #[must_use]
    pub const fn to_index(self, width: u32, height: u32) -> Option<usize> {
        if self.in_bounds(width, height) {
            Some((self.y as usize) * (width as usize) + (self.x as usize))
        } else {
            None
        }
    }

    /// Creates from a row-major linear index.
    #[must_use]
    pub const fn from_index(index: usize, width: u32) -> Self {
        let width = width as usize;
        Self {
            x: (index % width) as i32,
            y: (index / width) as i32,
        }
    }
}

impl From<(i32, i32)> for GridCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}
