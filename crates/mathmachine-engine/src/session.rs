//! Play session: one simulation plus the modes around it.
//!
//! The session owns the [`Simulation`] and is the only writer of its grid.
//! Edits arriving from other threads wait in a [`PlacementQueue`] and are
//! applied at the start of a frame, never during a tick.

use std::sync::Arc;

use mathmachine_common::{LevelError, MathMachineResult};
use mathmachine_kernel::level::LevelRecord;
use mathmachine_kernel::placement::{PlacementQueue, PlacementSender};
use mathmachine_kernel::simulation::Simulation;
use mathmachine_kernel::tile::{Tile, TileProperties};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::mode::{GameMode, ModeError, ModeMachine, ModeResult};
use crate::timing::TickScheduler;

/// Session shared between an input thread and the frame loop.
pub type SharedSession = Arc<Mutex<Session>>;

/// Notifications for the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The mode changed.
    ModeChanged {
        /// Previous mode.
        from: GameMode,
        /// New mode.
        to: GameMode,
    },
    /// A level was loaded.
    LevelLoaded {
        /// Width in cells.
        width: u32,
        /// Height in cells.
        height: u32,
    },
    /// Every output was satisfied.
    LevelComplete {
        /// Ticks the solution needed.
        ticks: u64,
    },
}

/// The default brush: an adder facing up.
#[must_use]
pub fn default_brush() -> TileProperties {
    TileProperties::new(Tile::Converter)
        .with_grabber_length(3)
        .with_required_score(10)
}

/// One play session.
#[derive(Debug)]
pub struct Session {
    /// The running level
    simulation: Simulation,
    /// Mode state machine
    modes: ModeMachine,
    /// Frame and win-check cadence
    scheduler: TickScheduler,
    /// Edits from other threads
    placements: PlacementQueue,
    /// Tile placed by [`Session::paint`]
    brush: TileProperties,
    /// Level as it was when the author pressed "play level"
    editor_level: Option<LevelRecord>,
    /// Level as it was when the player pressed "try solution"
    play_level: Option<LevelRecord>,
    /// Whether the level being played came from the level editor
    from_editor: bool,
    /// Grid as the last run left it
    last_run: Option<LevelRecord>,
    /// Pending notifications
    events: Vec<SessionEvent>,
}

impl Session {
    /// Creates a session on a blank level of the configured size.
    pub fn new(config: &EngineConfig) -> MathMachineResult<Self> {
        let simulation = Simulation::new(config.default_width, config.default_height)?;
        Ok(Self::with_simulation(simulation, config))
    }

    /// Creates a session around an existing simulation.
    #[must_use]
    pub fn with_simulation(simulation: Simulation, config: &EngineConfig) -> Self {
        info!(
            "Session created ({} frames per tick, win check every {} ticks)",
            config.frames_per_tick, config.win_check_interval
        );
        Self {
            simulation,
            modes: ModeMachine::new(),
            scheduler: TickScheduler::new(config.frames_per_tick, config.win_check_interval),
            placements: PlacementQueue::default(),
            brush: default_brush(),
            editor_level: None,
            play_level: None,
            from_editor: false,
            last_run: None,
            events: Vec::new(),
        }
    }

    /// Wraps the session for sharing across threads.
    #[must_use]
    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    /// Returns the current mode.
    #[must_use]
    pub fn mode(&self) -> GameMode {
        self.modes.current()
    }

    /// Returns the simulation.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Returns the brush.
    #[must_use]
    pub fn brush(&self) -> TileProperties {
        self.brush
    }

    /// Returns the frame scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    /// Creates a handle for queueing placements from another thread.
    #[must_use]
    pub fn placement_sender(&self) -> PlacementSender {
        self.placements.sender()
    }

    /// Returns the grid as the last run left it, before the cached level
    /// was restored.
    #[must_use]
    pub fn last_run(&self) -> Option<&LevelRecord> {
        self.last_run.as_ref()
    }

    /// Takes every pending notification.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Replaces the level. Cached editor and play levels are discarded.
    ///
    /// Not allowed while running.
    pub fn load_level(&mut self, record: &LevelRecord) -> MathMachineResult<()> {
        if self.mode().should_tick() {
            return Err(LevelError::Malformed(
                "cannot load a level while the simulation is running".to_string(),
            )
            .into());
        }
        self.simulation.load_level(record)?;
        self.editor_level = None;
        self.play_level = None;
        self.from_editor = false;
        let (width, height) = self.simulation.dimensions();
        self.events.push(SessionEvent::LevelLoaded { width, height });
        Ok(())
    }

    /// Captures the current level.
    #[must_use]
    pub fn snapshot(&self) -> LevelRecord {
        self.simulation.snapshot()
    }

    /// Replaces the brush tile type, keeping its other properties.
    pub fn select_tile(&mut self, tile: Tile) -> ModeResult<()> {
        let mut brush = self.brush;
        brush.set_tile(tile);
        self.set_brush(brush)
    }

    /// Replaces the whole brush.
    pub fn set_brush(&mut self, brush: TileProperties) -> ModeResult<()> {
        let mode = self.mode();
        if !mode.allows_tile(brush.tile) {
            return Err(ModeError::TileNotAllowed {
                tile: brush.tile,
                mode,
            });
        }
        self.brush = brush;
        Ok(())
    }

    /// Places the brush at `(x, y)`. Returns whether the cell changed.
    pub fn paint(&mut self, x: i32, y: i32) -> bool {
        let mode = self.mode();
        if !mode.allows_placement() {
            debug!("Ignoring paint at ({}, {}) in {:?}", x, y, mode);
            return false;
        }
        self.simulation
            .place_tile(x, y, self.brush, mode.is_editor_mode())
    }

    /// Menu -> game editor.
    pub fn enter_game_editor(&mut self) -> ModeResult<()> {
        self.ensure_mode(GameMode::Menu, GameMode::GameEditor)?;
        self.from_editor = false;
        self.transition(GameMode::GameEditor, None)
    }

    /// Menu -> level editor.
    pub fn enter_level_editor(&mut self) -> ModeResult<()> {
        self.ensure_mode(GameMode::Menu, GameMode::LevelEditor)?;
        self.transition(GameMode::LevelEditor, None)
    }

    /// Level editor -> game editor, remembering the authored level.
    pub fn play_level(&mut self) -> ModeResult<()> {
        self.ensure_mode(GameMode::LevelEditor, GameMode::GameEditor)?;
        self.editor_level = Some(self.simulation.snapshot());
        self.from_editor = true;
        self.transition(GameMode::GameEditor, Some("play level"))
    }

    /// Game editor -> running, remembering the solution.
    pub fn try_solution(&mut self) -> ModeResult<()> {
        self.ensure_mode(GameMode::GameEditor, GameMode::GameRunning)?;
        self.play_level = Some(self.simulation.snapshot());
        self.scheduler.reset();
        self.transition(GameMode::GameRunning, Some("try solution"))
    }

    /// Running -> game editor, restoring the solution as it was built.
    pub fn go_back(&mut self) -> ModeResult<()> {
        self.ensure_mode(GameMode::GameRunning, GameMode::GameEditor)?;
        self.last_run = Some(self.simulation.snapshot());
        self.restore(self.play_level.clone());
        self.transition(GameMode::GameEditor, Some("go back"))
    }

    /// Either editor -> menu.
    pub fn to_menu(&mut self) -> ModeResult<()> {
        self.transition(GameMode::Menu, None)
    }

    /// Advances one rendered frame.
    ///
    /// Applies queued placements, then, while running, ticks at the
    /// configured cadence and samples the win condition. Returns whether a
    /// tick ran.
    pub fn frame(&mut self) -> bool {
        let mode = self.mode();
        if mode.allows_placement() {
            let applied = self
                .simulation
                .drain_placements(&self.placements, mode.is_editor_mode());
            if applied > 0 {
                debug!("Applied {} queued placements", applied);
            }
        } else if !self.placements.is_empty() {
            let dropped = self.placements.drain().len();
            debug!("Dropped {} placements queued in {:?}", dropped, mode);
        }

        if !mode.should_tick() || !self.scheduler.frame() {
            return false;
        }

        self.simulation.tick();
        if self.scheduler.tick_completed() && self.simulation.is_level_complete() {
            self.complete_level();
        }
        true
    }

    /// Handles a win: notify, then return to the mode the level came from.
    fn complete_level(&mut self) {
        let ticks = self.simulation.tick_count();
        info!("Level complete after {} ticks", ticks);
        self.events.push(SessionEvent::LevelComplete { ticks });
        self.last_run = Some(self.simulation.snapshot());

        let result = if self.from_editor {
            self.restore(self.editor_level.clone());
            self.transition(GameMode::LevelEditor, Some("level complete"))
        } else {
            self.restore(self.play_level.clone());
            self.transition(GameMode::GameEditor, Some("level complete"))
        };
        if let Err(e) = result {
            warn!("Failed to leave the running mode: {}", e);
        }
    }

    fn restore(&mut self, level: Option<LevelRecord>) {
        if let Some(record) = level {
            if let Err(e) = self.simulation.load_level(&record) {
                warn!("Failed to restore cached level: {}", e);
            }
        }
    }

    fn ensure_mode(&self, expected: GameMode, target: GameMode) -> ModeResult<()> {
        let from = self.mode();
        if from == expected {
            Ok(())
        } else {
            Err(ModeError::InvalidTransition { from, to: target })
        }
    }

    fn transition(&mut self, target: GameMode, reason: Option<&str>) -> ModeResult<()> {
        let from = self.mode();
        self.modes
            .transition_to(target, reason.map(str::to_string))?;
        self.events.push(SessionEvent::ModeChanged { from, to: target });
        Ok(())
    }
}
