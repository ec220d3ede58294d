//! # Math Machine Common
//!
//! Common types shared by every Math Machine crate.
//!
//! This crate provides:
//! - Grid coordinate type and row-major indexing helpers
//! - The error taxonomy (layout parsing, level transport, grid access, encoding)
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coord_index_round_trip() {
        let coord = GridCoord::new(3, 2);
        let index = coord.to_index(16, 16).expect("in bounds");
        assert_eq!(index, 35);
        assert_eq!(GridCoord::from_index(index, 16), coord);
    }

    #[test]
    fn test_error_conversion() {
        let err: MathMachineError = GridError::OutOfBounds {
            x: -1,
            y: 4,
            width: 8,
            height: 8,
        }
        .into();
        assert!(err.to_string().contains("(-1, 4)"));
    }
}
