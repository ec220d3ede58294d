//! # Math Machine
//!
//! Headless runner: loads a level, runs the solution in it and writes the
//! final grid next to the input.
//!
//! ```text
//! mathmachine [LEVEL_FILE] [FRAMES]
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use mathmachine_engine::config::EngineConfig;
use mathmachine_engine::level_io::{load_level_file, output_path_for, save_level_file};
use mathmachine_engine::mode::GameMode;
use mathmachine_engine::session::{Session, SessionEvent};
use mathmachine_kernel::simulation::Simulation;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    let config = EngineConfig::load();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(config.log_filter.parse()?))
        .init();

    info!("Math Machine starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let level_path = args.next().map(PathBuf::from);
    let max_frames = match args.next() {
        Some(frames) => frames
            .parse::<u64>()
            .with_context(|| format!("invalid frame count: {frames}"))?,
        None => config.max_frames,
    };

    let mut session = match &level_path {
        Some(path) => {
            let record = load_level_file(path)
                .with_context(|| format!("failed to load level {}", path.display()))?;
            Session::with_simulation(Simulation::from_level(&record)?, &config)
        },
        None => {
            info!(
                "No level given, using a blank {}x{} grid",
                config.default_width, config.default_height
            );
            Session::new(&config)?
        },
    };

    session.enter_game_editor()?;
    session.try_solution()?;

    let mut frames = 0;
    while frames < max_frames && session.mode() == GameMode::GameRunning {
        session.frame();
        frames += 1;
    }

    let completed_after = session
        .drain_events()
        .into_iter()
        .find_map(|event| match event {
            SessionEvent::LevelComplete { ticks } => Some(ticks),
            _ => None,
        });

    let final_state = match completed_after {
        Some(ticks) => {
            info!("Level complete after {} frames ({} ticks)", frames, ticks);
            session.last_run().cloned().unwrap_or_else(|| session.snapshot())
        },
        None => {
            warn!(
                "Level not complete after {} frames ({} ticks)",
                frames,
                session.simulation().tick_count()
            );
            session.snapshot()
        },
    };

    match &level_path {
        Some(path) => {
            let out = output_path_for(path);
            save_level_file(&out, &final_state)
                .with_context(|| format!("failed to save {}", out.display()))?;
        },
        None => info!("No level file given, final grid not saved"),
    }

    info!("Math Machine shutdown complete");
    Ok(())
}
