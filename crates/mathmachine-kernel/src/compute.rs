//! Tick engine: advances the grid one generation at a time.
//!
//! Every cell of the next generation depends only on the previous one, so
//! rows are computed independently. The parallel path hands each row to
//! rayon; the serial path exists for tiny grids and for checking that both
//! produce the same bits.

use mathmachine_common::GridCoord;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::buffer::GridStore;
use crate::layout::PixelSpec;
use crate::rules::{next_pixel, Neighborhood};

/// Grids with fewer cells than this are stepped serially by
/// [`ExecutionMode::Auto`].
pub const PARALLEL_THRESHOLD: usize = 4096;

/// How a tick distributes its per-cell work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One row after another on the calling thread
    Serial,
    /// Rows spread over the rayon pool
    Parallel,
    /// Parallel above [`PARALLEL_THRESHOLD`] cells, serial below
    #[default]
    Auto,
}

impl ExecutionMode {
    fn is_parallel_for(self, cell_count: usize) -> bool {
        match self {
            Self::Serial => false,
            Self::Parallel => true,
            Self::Auto => cell_count >= PARALLEL_THRESHOLD,
        }
    }
}

/// Steps a [`GridStore`] through generations.
#[derive(Debug, Clone, Default)]
pub struct TickEngine {
    /// Work distribution
    mode: ExecutionMode,
    /// Completed ticks since creation or the last reset
    tick_count: u64,
}

impl TickEngine {
    /// Creates an engine with the given execution mode.
    #[must_use]
    pub fn new(mode: ExecutionMode) -> Self {
        info!("Creating tick engine ({:?})", mode);
        Self {
            mode,
            tick_count: 0,
        }
    }

    /// Advances `store` by exactly one generation.
    pub fn step(&mut self, store: &mut GridStore, spec: &PixelSpec) {
        let (width, height) = (store.width(), store.height());
        let parallel = self.mode.is_parallel_for(store.cell_count());
        let (previous, current) = store.begin_generation();
        let hood = Neighborhood::new(previous, width, height, spec);

        let row_len = width as usize;
        let compute_row = |(y, row): (usize, &mut [_])| {
            for (x, out) in row.iter_mut().enumerate() {
                *out = next_pixel(&hood, GridCoord::new(x as i32, y as i32));
            }
        };

        if parallel {
            current
                .par_chunks_mut(row_len)
                .enumerate()
                .for_each(compute_row);
        } else {
            current.chunks_mut(row_len).enumerate().for_each(compute_row);
        }

        self.tick_count += 1;
        debug!("Tick {} complete ({}x{})", self.tick_count, width, height);
    }

    /// Completed ticks.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Resets the tick counter, e.g. after a level load.
    pub fn reset(&mut self) {
        self.tick_count = 0;
    }

    /// Work distribution in use.
    #[must_use]
    pub const fn mode(&self) -> ExecutionMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode, Pixel};
    use crate::tile::{Direction, Operation, Tile, TileProperties};

    fn spec() -> &'static PixelSpec {
        PixelSpec::standard().expect("standard layout parses")
    }

    fn input(num: u16, direction: Direction) -> TileProperties {
        TileProperties::new(Tile::Input)
            .with_num(num)
            .with_direction(direction)
    }

    /// A busy little factory: two inputs feeding an adder through
    /// conveyors, a grabber relay and an output.
    fn factory(width: u32, height: u32) -> GridStore {
        let spec = spec();
        let mut store = GridStore::new(width, height, encode(&TileProperties::default(), spec));
        let mut put = |x: i32, y: i32, props: TileProperties| {
            store
                .set_pixel(GridCoord::new(x, y), encode(&props, spec))
                .expect("in bounds");
        };
        put(0, 2, input(3, Direction::Right));
        put(1, 2, TileProperties::new(Tile::Conveyor).with_direction(Direction::Right));
        put(2, 2, TileProperties::new(Tile::Converter).with_operation(Operation::Add));
        put(3, 2, TileProperties::new(Tile::Conveyor).with_direction(Direction::Left));
        put(4, 2, input(4, Direction::Left));
        put(2, 1, TileProperties::new(Tile::Conveyor).with_direction(Direction::Up));
        put(
            2,
            0,
            TileProperties::new(Tile::Output)
                .with_num(7)
                .with_required_score(3),
        );
        put(6, 4, input(1, Direction::Left));
        put(
            5,
            4,
            TileProperties::new(Tile::Grabber)
                .with_direction(Direction::Right)
                .with_grabber_length(2),
        );
        put(4, 4, TileProperties::new(Tile::Conveyor).with_direction(Direction::Left));
        store
    }

    #[test]
    fn test_parallel_matches_serial() {
        let mut serial_store = factory(80, 60);
        let mut parallel_store = serial_store.clone();
        let mut serial = TickEngine::new(ExecutionMode::Serial);
        let mut parallel = TickEngine::new(ExecutionMode::Parallel);

        for _ in 0..40 {
            serial.step(&mut serial_store, spec());
            parallel.step(&mut parallel_store, spec());
            assert_eq!(serial_store.current(), parallel_store.current());
        }
        assert_eq!(serial.tick_count(), 40);
    }

    #[test]
    fn test_factory_completes_output() {
        let mut store = factory(8, 6);
        let mut engine = TickEngine::default();
        for _ in 0..40 {
            engine.step(&mut store, spec());
        }
        let output = decode(&store.pixel(GridCoord::new(2, 0)).expect("in bounds"), spec());
        assert_eq!(output.tile, Tile::Complete);
        assert_eq!(output.score, 3);
    }

    #[test]
    fn test_previous_holds_last_generation() {
        let mut store = factory(8, 6);
        let mut engine = TickEngine::new(ExecutionMode::Serial);
        engine.step(&mut store, spec());
        let after_one = store.current().to_vec();
        engine.step(&mut store, spec());
        assert_eq!(store.previous(), after_one.as_slice());
    }

    #[test]
    fn test_empty_grid_is_stable() {
        let mut store = GridStore::new(5, 3, Pixel::EMPTY);
        let mut engine = TickEngine::default();
        engine.step(&mut store, spec());
        assert!(store.current().iter().all(|pixel| *pixel == Pixel::EMPTY));
        assert_eq!(engine.tick_count(), 1);

        engine.reset();
        assert_eq!(engine.tick_count(), 0);
    }

    #[test]
    fn test_auto_mode_threshold() {
        assert!(!ExecutionMode::Auto.is_parallel_for(PARALLEL_THRESHOLD - 1));
        assert!(ExecutionMode::Auto.is_parallel_for(PARALLEL_THRESHOLD));
        assert!(!ExecutionMode::Serial.is_parallel_for(usize::MAX));
        assert!(ExecutionMode::Parallel.is_parallel_for(1));
    }
}
