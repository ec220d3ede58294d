//! Game mode state machine.
//!
//! This module provides:
//! - GameMode enum with all session modes
//! - State machine with valid transitions and a bounded history
//! - Query methods for what each mode allows

use mathmachine_kernel::tile::Tile;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Errors that can occur while changing modes or editing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeError {
    /// Invalid mode transition.
    #[error("Invalid mode transition from {from:?} to {to:?}")]
    InvalidTransition {
        /// Source mode.
        from: GameMode,
        /// Target mode.
        to: GameMode,
    },

    /// The brush may not hold this tile in the current mode.
    #[error("{tile:?} tiles cannot be selected in {mode:?}")]
    TileNotAllowed {
        /// Requested tile.
        tile: Tile,
        /// Mode that refused it.
        mode: GameMode,
    },
}

/// Result type for mode operations.
pub type ModeResult<T> = Result<T, ModeError>;

/// All session modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GameMode {
    /// Main menu.
    #[default]
    Menu,
    /// The player builds a solution; editability is enforced.
    GameEditor,
    /// The author builds a level; any cell can be overwritten.
    LevelEditor,
    /// The simulation runs; no placement.
    GameRunning,
}

impl GameMode {
    /// Returns display name for the mode.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Menu => "Menu",
            Self::GameEditor => "Game Editor",
            Self::LevelEditor => "Level Editor",
            Self::GameRunning => "Running",
        }
    }

    /// Returns whether ticks run in this mode.
    #[must_use]
    pub fn should_tick(self) -> bool {
        matches!(self, Self::GameRunning)
    }

    /// Returns whether tiles can be placed in this mode.
    #[must_use]
    pub fn allows_placement(self) -> bool {
        matches!(self, Self::GameEditor | Self::LevelEditor)
    }

    /// Returns whether placement ignores editability.
    #[must_use]
    pub fn is_editor_mode(self) -> bool {
        matches!(self, Self::LevelEditor)
    }

    /// Returns whether the brush may hold `tile` in this mode.
    ///
    /// Only the game editor restricts the brush, to the player tiles.
    #[must_use]
    pub fn allows_tile(self, tile: Tile) -> bool {
        match self {
            Self::GameEditor => tile.is_editable(),
            Self::Menu | Self::LevelEditor | Self::GameRunning => true,
        }
    }

    /// Returns valid transitions from this mode.
    #[must_use]
    pub fn valid_transitions(self) -> &'static [GameMode] {
        match self {
            Self::Menu => &[Self::GameEditor, Self::LevelEditor],
            Self::LevelEditor => &[Self::GameEditor, Self::Menu],
            Self::GameEditor => &[Self::GameRunning, Self::Menu],
            Self::GameRunning => &[Self::GameEditor, Self::LevelEditor],
        }
    }

    /// Checks if transition to target mode is valid.
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        self.valid_transitions().contains(&target)
    }
}

/// Record of a mode transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeTransition {
    /// Previous mode.
    pub from: GameMode,
    /// New mode.
    pub to: GameMode,
    /// Reason for transition.
    pub reason: Option<String>,
}

/// State machine for session modes.
#[derive(Debug, Clone)]
pub struct ModeMachine {
    /// Current mode.
    current: GameMode,
    /// Previous mode.
    previous: Option<GameMode>,
    /// Transition history.
    history: Vec<ModeTransition>,
    /// Maximum history entries.
    max_history: usize,
}

impl Default for ModeMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeMachine {
    /// Creates a machine starting at the menu.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: GameMode::Menu,
            previous: None,
            history: Vec::new(),
            max_history: 50,
        }
    }

    /// Returns the current mode.
    #[must_use]
    pub fn current(&self) -> GameMode {
        self.current
    }

    /// Returns the previous mode.
    #[must_use]
    pub fn previous(&self) -> Option<GameMode> {
        self.previous
    }

    /// Returns the transition history, oldest first.
    #[must_use]
    pub fn history(&self) -> &[ModeTransition] {
        &self.history
    }

    /// Attempts to move to `target`.
    pub fn transition_to(&mut self, target: GameMode, reason: Option<String>) -> ModeResult<()> {
        if !self.current.can_transition_to(target) {
            return Err(ModeError::InvalidTransition {
                from: self.current,
                to: target,
            });
        }

        let from = self.current;
        self.previous = Some(from);
        self.current = target;

        info!(
            "Mode transition: {} -> {}{}",
            from.display_name(),
            target.display_name(),
            reason
                .as_ref()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default()
        );

        self.history.push(ModeTransition {
            from,
            to: target,
            reason,
        });
        while self.history.len() > self.max_history {
            self.history.remove(0);
        }
        Ok(())
    }
}
