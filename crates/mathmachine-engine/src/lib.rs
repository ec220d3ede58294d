//! # Math Machine Engine
//!
//! Session layer around the simulation kernel.
//!
//! This crate provides:
//! - Engine configuration loaded from `mathmachine.toml`
//! - Game modes (menu, game editor, level editor, running) and their
//!   transitions
//! - The frame-driven tick and win-check cadence
//! - Level files on disk

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod level_io;
pub mod mode;
pub mod session;
pub mod timing;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::level_io::*;
    pub use crate::mode::*;
    pub use crate::session::*;
    pub use crate::timing::*;
}
