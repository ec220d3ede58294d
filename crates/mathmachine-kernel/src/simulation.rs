//! Simulation facade: the entry points the session and render layer use.
//!
//! A [`Simulation`] owns the grid exclusively. Ticks take `&mut self`, so a
//! placement can never interleave with a write pass; edits from other
//! threads go through a [`PlacementQueue`] drained between ticks.

use std::sync::Arc;

use mathmachine_common::{GridCoord, GridError, LevelError, MathMachineResult};
use tracing::{debug, info};

use crate::buffer::GridStore;
use crate::codec::{decode, encode, Pixel};
use crate::compute::{ExecutionMode, TickEngine};
use crate::layout::PixelSpec;
use crate::level::{self, LevelRecord};
use crate::placement::PlacementQueue;
use crate::rules::level_complete;
use crate::tile::TileProperties;

/// A loaded level and the machinery to run it.
#[derive(Debug, Clone)]
pub struct Simulation {
    /// Double-buffered cells
    grid: GridStore,
    /// Generation stepper
    engine: TickEngine,
    /// Bit layout shared by encode, decode and the rule set
    spec: Arc<PixelSpec>,
}

impl Simulation {
    /// Creates a blank level using the canonical pixel layout.
    pub fn new(width: u32, height: u32) -> MathMachineResult<Self> {
        let spec = Arc::new(PixelSpec::standard()?.clone());
        Ok(Self::with_spec(width, height, spec)?)
    }

    /// Creates a blank level with a custom pixel layout.
    ///
    /// Every cell starts as an editable NONE tile.
    pub fn with_spec(width: u32, height: u32, spec: Arc<PixelSpec>) -> Result<Self, LevelError> {
        let cells = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| LevelError::Malformed("grid dimensions overflow".to_string()))?;
        let blank = encode(&TileProperties::default(), &spec);
        let grid = GridStore::with_pixels(width, height, vec![blank; cells])?;
        info!("Simulation ready ({}x{})", width, height);
        Ok(Self {
            grid,
            engine: TickEngine::default(),
            spec,
        })
    }

    /// Creates a simulation from a level record using the canonical layout.
    pub fn from_level(record: &LevelRecord) -> MathMachineResult<Self> {
        let spec = Arc::new(PixelSpec::standard()?.clone());
        let grid = level::deserialize(record)?;
        Ok(Self {
            grid,
            engine: TickEngine::default(),
            spec,
        })
    }

    /// Returns the simulation with a different work distribution.
    #[must_use]
    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.engine = TickEngine::new(mode);
        self
    }

    /// Replaces the grid with a level.
    ///
    /// On error the current level stays loaded. The tick counter restarts.
    pub fn load_level(&mut self, record: &LevelRecord) -> Result<(), LevelError> {
        self.grid = level::deserialize(record)?;
        self.engine.reset();
        Ok(())
    }

    /// Writes `properties` at `(x, y)`.
    ///
    /// Outside editor mode only editable cells can be overwritten. The
    /// written properties are normalized first. Returns whether the cell
    /// changed hands.
    pub fn place_tile(&mut self, x: i32, y: i32, properties: TileProperties, editor_mode: bool) -> bool {
        let coord = GridCoord::new(x, y);
        let existing = match self.grid.pixel(coord) {
            Ok(pixel) => decode(&pixel, &self.spec),
            Err(e) => {
                debug!("Placement rejected: {}", e);
                return false;
            },
        };
        if !existing.editable && !editor_mode {
            debug!(
                "Placement rejected: {} at ({}, {}) is not editable",
                existing.tile.display_name(),
                x,
                y
            );
            return false;
        }

        let placed = properties.normalized();
        self.grid.set_pixel(coord, encode(&placed, &self.spec)).is_ok()
    }

    /// Applies every queued placement. Returns how many were accepted.
    pub fn drain_placements(&mut self, queue: &PlacementQueue, editor_mode: bool) -> usize {
        queue
            .drain()
            .into_iter()
            .filter(|p| self.place_tile(p.coord.x, p.coord.y, p.properties, editor_mode))
            .count()
    }

    /// Decoded properties of a cell in the current generation.
    pub fn read_pixel(&self, x: i32, y: i32) -> Result<TileProperties, GridError> {
        let pixel = self.grid.pixel(GridCoord::new(x, y))?;
        Ok(decode(&pixel, &self.spec))
    }

    /// Raw pixel of a cell in the current generation.
    pub fn raw_pixel(&self, x: i32, y: i32) -> Result<Pixel, GridError> {
        self.grid.pixel(GridCoord::new(x, y))
    }

    /// Advances one generation.
    pub fn tick(&mut self) {
        self.engine.step(&mut self.grid, &self.spec);
    }

    /// Advances `ticks` generations.
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Captures the current generation.
    #[must_use]
    pub fn snapshot(&self) -> LevelRecord {
        level::serialize(&self.grid)
    }

    /// Whether the current generation satisfies the win condition.
    #[must_use]
    pub fn is_level_complete(&self) -> bool {
        level_complete(self.grid.current(), &self.spec)
    }

    /// Grid `(width, height)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.grid.width(), self.grid.height())
    }

    /// Ticks completed since the level was loaded.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.engine.tick_count()
    }

    /// The pixel layout in use.
    #[must_use]
    pub fn spec(&self) -> &PixelSpec {
        &self.spec
    }

    /// Current generation as raw bytes for a render upload.
    #[must_use]
    pub fn current_bytes(&self) -> &[u8] {
        self.grid.current_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::Placement;
    use crate::tile::{Direction, Operation, Tile};

    fn sim(width: u32, height: u32) -> Simulation {
        Simulation::new(width, height).expect("valid dimensions")
    }

    fn conveyor(direction: Direction) -> TileProperties {
        TileProperties::new(Tile::Conveyor).with_direction(direction)
    }

    fn input(num: u16, direction: Direction) -> TileProperties {
        TileProperties::new(Tile::Input)
            .with_num(num)
            .with_direction(direction)
    }

    #[test]
    fn test_new_grid_is_editable_none() {
        let sim = sim(4, 3);
        assert_eq!(sim.dimensions(), (4, 3));
        let cell = sim.read_pixel(3, 2).expect("in bounds");
        assert_eq!(cell.tile, Tile::None);
        assert!(cell.editable);
        assert!(matches!(
            sim.read_pixel(4, 0),
            Err(GridError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(Simulation::new(0, 5).is_err());
        assert!(Simulation::new(5, 0).is_err());
    }

    #[test]
    fn test_zero_ticks_leaves_grid_identical() {
        let mut sim = sim(5, 5);
        assert!(sim.place_tile(1, 1, TileProperties::new(Tile::Input).with_num(4), true));
        let before = sim.snapshot();
        sim.run(0);
        assert_eq!(sim.snapshot(), before);
        assert_eq!(sim.tick_count(), 0);
    }

    #[test]
    fn test_placement_legality() {
        let mut sim = sim(4, 4);
        assert!(sim.place_tile(0, 0, TileProperties::new(Tile::Wall), false));
        // The wall is no longer editable.
        assert!(!sim.place_tile(0, 0, conveyor(Direction::Up), false));
        assert_eq!(sim.read_pixel(0, 0).expect("in bounds").tile, Tile::Wall);
        // Editor mode overrides.
        assert!(sim.place_tile(0, 0, conveyor(Direction::Up), true));
        assert_eq!(sim.read_pixel(0, 0).expect("in bounds").tile, Tile::Conveyor);
        // Outside the grid.
        assert!(!sim.place_tile(-1, 0, conveyor(Direction::Up), true));
        assert!(!sim.place_tile(0, 4, conveyor(Direction::Up), true));
    }

    #[test]
    fn test_placement_normalizes() {
        let mut sim = sim(2, 1);
        let mut sneaky = conveyor(Direction::Right).carrying(9);
        sneaky.editable = false;
        sneaky.has_lhs = true;
        assert!(sim.place_tile(0, 0, sneaky, false));
        let placed = sim.read_pixel(0, 0).expect("in bounds");
        assert!(placed.editable);
        assert!(!placed.has_num);
        assert!(!placed.has_lhs);

        let mut input = TileProperties::new(Tile::Input).with_num(3);
        input.has_num = false;
        assert!(sim.place_tile(1, 0, input, true));
        assert!(sim.read_pixel(1, 0).expect("in bounds").has_num);
    }

    #[test]
    fn test_conveyor_right_moves_one_cell_per_tick() {
        let mut sim = sim(6, 1);
        assert!(sim.place_tile(0, 0, input(2, Direction::Right), true));
        for x in 1..6 {
            assert!(sim.place_tile(x, 0, conveyor(Direction::Right), false));
        }
        sim.tick();
        // Each tick the leading payload advances exactly one cell.
        for tick in 1..5 {
            let lead = (1..6)
                .rev()
                .find(|&x| sim.read_pixel(x, 0).expect("in bounds").has_num)
                .expect("a payload is on the belt");
            assert_eq!(lead, tick);
            sim.tick();
        }
    }

    #[test]
    fn test_determinism() {
        // The same placements at the same tick boundaries, one run serial and
        // one parallel.
        let script = |sim: &mut Simulation| {
            let mut snapshots = Vec::new();
            sim.place_tile(2, 5, input(6, Direction::Up), true);
            sim.place_tile(2, 2, input(7, Direction::Down), true);
            sim.place_tile(2, 4, conveyor(Direction::Up), false);
            sim.run(3);
            snapshots.push(sim.snapshot());

            // Facing RIGHT: lhs from above, rhs from below.
            sim.place_tile(
                2,
                3,
                TileProperties::new(Tile::Converter)
                    .with_direction(Direction::Right)
                    .with_operation(Operation::Mul),
                false,
            );
            sim.place_tile(3, 3, conveyor(Direction::Right), false);
            sim.run(4);
            snapshots.push(sim.snapshot());

            sim.place_tile(
                4,
                3,
                TileProperties::new(Tile::Output)
                    .with_num(42)
                    .with_required_score(2),
                true,
            );
            sim.run(18);
            snapshots.push(sim.snapshot());
            snapshots
        };

        let mut a = sim(8, 8).with_execution_mode(ExecutionMode::Serial);
        let mut b = sim(8, 8).with_execution_mode(ExecutionMode::Parallel);
        assert_eq!(script(&mut a), script(&mut b));
        assert_eq!(a.tick_count(), 25);
        assert!(a.is_level_complete());
    }

    #[test]
    fn test_win_condition() {
        let mut sim = sim(3, 1);
        assert!(!sim.is_level_complete());
        sim.place_tile(0, 0, input(5, Direction::Right), true);
        sim.place_tile(1, 0, conveyor(Direction::Right), false);
        sim.place_tile(
            2,
            0,
            TileProperties::new(Tile::Output)
                .with_num(5)
                .with_required_score(2),
            true,
        );
        sim.run(4);
        assert!(!sim.is_level_complete());
        sim.tick();
        assert!(sim.is_level_complete());
        assert_eq!(sim.read_pixel(2, 0).expect("in bounds").tile, Tile::Complete);
    }

    #[test]
    fn test_snapshot_load_round_trip() {
        let mut sim = sim(3, 3);
        sim.place_tile(1, 1, TileProperties::new(Tile::Wall), true);
        sim.tick();
        let record = sim.snapshot();

        let mut other = Simulation::from_level(&record).expect("valid record");
        assert_eq!(other.snapshot(), record);
        other.run(3);
        assert_eq!(other.read_pixel(1, 1).expect("in bounds").tile, Tile::Wall);
    }

    #[test]
    fn test_failed_load_keeps_level() {
        let mut sim = sim(2, 2);
        sim.place_tile(0, 0, TileProperties::new(Tile::Wall), true);
        sim.tick();
        let before = sim.snapshot();

        let mut bad = LevelRecord::blank(2, 2);
        bad.data.truncate(7);
        assert!(sim.load_level(&bad).is_err());
        assert_eq!(sim.snapshot(), before);
        assert_eq!(sim.tick_count(), 1);

        sim.load_level(&LevelRecord::blank(5, 1)).expect("valid record");
        assert_eq!(sim.dimensions(), (5, 1));
        assert_eq!(sim.tick_count(), 0);
    }

    #[test]
    fn test_drain_placements_respects_editability() {
        let mut sim = sim(3, 1);
        sim.place_tile(2, 0, TileProperties::new(Tile::Wall), true);

        let queue = PlacementQueue::default();
        queue.push(Placement::new(0, 0, conveyor(Direction::Right)));
        queue.push(Placement::new(2, 0, conveyor(Direction::Right)));
        queue.push(Placement::new(9, 0, conveyor(Direction::Right)));

        assert_eq!(sim.drain_placements(&queue, false), 1);
        assert!(queue.is_empty());
        assert_eq!(sim.read_pixel(0, 0).expect("in bounds").tile, Tile::Conveyor);
        assert_eq!(sim.read_pixel(2, 0).expect("in bounds").tile, Tile::Wall);
    }

    #[test]
    fn test_raw_pixel_matches_encoding() {
        let mut sim = sim(2, 2);
        let wall = TileProperties::new(Tile::Wall);
        assert!(sim.place_tile(1, 0, wall, true));
        assert_eq!(sim.raw_pixel(1, 0), Ok(encode(&wall, sim.spec())));
        assert_eq!(sim.raw_pixel(0, 0), Ok(encode(&TileProperties::default(), sim.spec())));
        assert!(matches!(
            sim.raw_pixel(0, -1),
            Err(GridError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_render_bytes_cover_grid() {
        let sim = sim(4, 2);
        assert_eq!(sim.current_bytes().len(), 4 * 2 * 16);
    }
}
