//! # Math Machine Kernel
//!
//! Pixel-encoded tile simulation for Math Machine.
//!
//! This crate provides the deterministic core of the game:
//! - The shared bit-field layout and the pixel codec built from it
//! - The tile model (conveyors, grabbers, converters, inputs, outputs)
//! - Double-buffered grid storage
//! - The per-cell rule set and the tick engine that applies it
//! - A bounded placement queue for edits from other threads
//! - Level records for load and save
//!
//! ## Architecture
//!
//! Every cell of the grid is one [`Pixel`] of four `u32` channels. The
//! layout of the fields inside those channels is data: it is parsed from
//! [`PIXEL_LAYOUT_SOURCE`], the same text a render-side decoder reads, so
//! the two can never disagree.
//!
//! ## Double Buffering
//!
//! A tick reads only the previous generation and writes every cell of the
//! current one:
//! - The current buffer becomes the previous buffer at the start of a tick
//! - Each cell's next pixel is a pure function of the previous generation
//! - Rows are therefore computed in parallel with no synchronization
//!
//! Given the same grid and the same number of ticks the result is identical
//! bit for bit, regardless of how the work was split.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod buffer;
pub mod codec;
pub mod compute;
pub mod layout;
pub mod level;
pub mod placement;
pub mod rules;
pub mod simulation;
pub mod tile;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::buffer::*;
    pub use crate::codec::*;
    pub use crate::compute::*;
    pub use crate::layout::*;
    pub use crate::level::*;
    pub use crate::placement::*;
    pub use crate::rules::*;
    pub use crate::simulation::*;
    pub use crate::tile::*;
}

pub use prelude::*;
