//! Simulation cadence.
//!
//! The simulation does not advance on every rendered frame: one tick runs
//! every `frames_per_tick` frames, and the win condition is sampled every
//! `win_check_interval` ticks.

/// Frame-driven tick scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickScheduler {
    /// Rendered frames per tick
    frames_per_tick: u32,
    /// Ticks between win checks
    win_check_interval: u32,
    /// Frames since the last tick
    frame_accumulator: u32,
    /// Ticks since the last win check
    tick_accumulator: u32,
    /// Frames seen in total
    total_frames: u64,
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new(4, 30)
    }
}

impl TickScheduler {
    /// Create a scheduler.
    ///
    /// # Arguments
    /// * `frames_per_tick` - Rendered frames per simulation tick (min 1)
    /// * `win_check_interval` - Ticks between win-condition checks (min 1)
    #[must_use]
    pub fn new(frames_per_tick: u32, win_check_interval: u32) -> Self {
        Self {
            frames_per_tick: frames_per_tick.max(1),
            win_check_interval: win_check_interval.max(1),
            frame_accumulator: 0,
            tick_accumulator: 0,
            total_frames: 0,
        }
    }

    /// Record a rendered frame.
    /// Returns whether a tick is due on this frame.
    pub fn frame(&mut self) -> bool {
        self.total_frames += 1;
        self.frame_accumulator += 1;
        if self.frame_accumulator >= self.frames_per_tick {
            self.frame_accumulator = 0;
            true
        } else {
            false
        }
    }

    /// Record a completed tick.
    /// Returns whether the win condition should be sampled now.
    pub fn tick_completed(&mut self) -> bool {
        self.tick_accumulator += 1;
        if self.tick_accumulator >= self.win_check_interval {
            self.tick_accumulator = 0;
            true
        } else {
            false
        }
    }

    /// Get the rendered frames per tick.
    #[must_use]
    pub const fn frames_per_tick(&self) -> u32 {
        self.frames_per_tick
    }

    /// Get the ticks between win checks.
    #[must_use]
    pub const fn win_check_interval(&self) -> u32 {
        self.win_check_interval
    }

    /// Get the number of frames recorded.
    #[must_use]
    pub const fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Reset the cadence (call when a run starts or stops).
    pub fn reset(&mut self) {
        self.frame_accumulator = 0;
        self.tick_accumulator = 0;
    }
}
