//! Tile model: the logical record stored in every grid cell.
//!
//! A cell's role is a [`Tile`]; everything else about it (facing, payload,
//! scoring) lives in [`TileProperties`]. The packed form is produced by the
//! codec in [`crate::codec`].

use mathmachine_common::GridCoord;
use serde::{Deserialize, Serialize};

/// Largest number a payload, INPUT or OUTPUT can hold (15 bits).
pub const NUM_MAX: u16 = 32_767;

/// Shortest reach a grabber can be configured with.
pub const MIN_GRABBER_LENGTH: u8 = 2;

/// Longest reach a grabber can be configured with. Also bounds the
/// neighbourhood a tick ever inspects.
pub const MAX_GRABBER_LENGTH: u8 = 4;

/// The role of a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Tile {
    /// Empty floor
    #[default]
    None = 0,
    /// Moves a payload one cell toward its direction
    Conveyor = 1,
    /// Picks payloads up at range and drops them behind itself
    Grabber = 2,
    /// Combines two operands with an arithmetic operation
    Converter = 3,
    /// Inexhaustible payload source
    Input = 4,
    /// Payload sink that scores matching deliveries
    Output = 5,
    /// Immutable blocker
    Wall = 6,
    /// A satisfied output
    Complete = 7,
}

impl Tile {
    /// Every tile, in discriminant order.
    pub const ALL: [Tile; 8] = [
        Tile::None,
        Tile::Conveyor,
        Tile::Grabber,
        Tile::Converter,
        Tile::Input,
        Tile::Output,
        Tile::Wall,
        Tile::Complete,
    ];

    /// Decodes a raw type field. Unrecognized values are inert `None`.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        match bits {
            1 => Self::Conveyor,
            2 => Self::Grabber,
            3 => Self::Converter,
            4 => Self::Input,
            5 => Self::Output,
            6 => Self::Wall,
            7 => Self::Complete,
            _ => Self::None,
        }
    }

    /// Whether a player may overwrite a cell of this type outside editor mode.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(
            self,
            Self::None | Self::Conveyor | Self::Grabber | Self::Converter
        )
    }

    /// Whether the tile's number is a configured value rather than a payload.
    #[must_use]
    pub const fn carries_number(self) -> bool {
        matches!(self, Self::Input | Self::Output)
    }

    /// Whether the tile can hold a payload in transit.
    #[must_use]
    pub const fn is_carrier(self) -> bool {
        matches!(self, Self::Conveyor | Self::Grabber | Self::Converter)
    }

    /// Display name for editor palettes.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Conveyor => "Conveyor",
            Self::Grabber => "Grabber",
            Self::Converter => "Converter",
            Self::Input => "Input",
            Self::Output => "Output",
            Self::Wall => "Wall",
            Self::Complete => "Complete",
        }
    }
}

/// Facing of a directional tile.
///
/// `Up` points toward row 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    /// Toward `y - 1`
    #[default]
    Up = 0,
    /// Toward `y + 1`
    Down = 1,
    /// Toward `x - 1`
    Left = 2,
    /// Toward `x + 1`
    Right = 3,
}

impl Direction {
    /// All directions in arbitration order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Decodes a raw direction field (only the low two bits matter).
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Self::Up,
            1 => Self::Down,
            2 => Self::Left,
            _ => Self::Right,
        }
    }

    /// Unit step `(dx, dy)` for this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// The opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Quarter turn counter-clockwise (the left-hand side when facing `self`).
    #[must_use]
    pub const fn rotate_ccw(self) -> Self {
        match self {
            Self::Up => Self::Left,
            Self::Left => Self::Down,
            Self::Down => Self::Right,
            Self::Right => Self::Up,
        }
    }

    /// Quarter turn clockwise (the right-hand side when facing `self`).
    #[must_use]
    pub const fn rotate_cw(self) -> Self {
        self.rotate_ccw().opposite()
    }

    /// Moves `coord` `steps` cells in this direction.
    #[must_use]
    pub const fn advance(self, coord: GridCoord, steps: i32) -> GridCoord {
        let (dx, dy) = self.delta();
        coord.step(dx, dy, steps)
    }
}

/// Arithmetic applied by a converter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Operation {
    /// `lhs + rhs`
    #[default]
    Add = 0,
    /// `lhs - rhs`
    Sub = 1,
    /// `lhs * rhs`
    Mul = 2,
    /// `lhs / rhs`
    Div = 3,
}

impl Operation {
    /// Decodes a raw operation field (only the low two bits matter).
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Self::Add,
            1 => Self::Sub,
            2 => Self::Mul,
            _ => Self::Div,
        }
    }

    /// Applies the operation.
    ///
    /// Results stay within `0..=NUM_MAX`: `Add` and `Mul` saturate high,
    /// `Sub` saturates at zero, `Div` truncates toward zero and dividing by
    /// zero yields zero.
    #[must_use]
    pub fn apply(self, lhs: u16, rhs: u16) -> u16 {
        let (lhs, rhs) = (u32::from(lhs), u32::from(rhs));
        let result = match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs.saturating_sub(rhs),
            Self::Mul => lhs * rhs,
            Self::Div => lhs.checked_div(rhs).unwrap_or(0),
        };
        result.min(u32::from(NUM_MAX)) as u16
    }
}

/// Decoded properties of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileProperties {
    /// Role of the cell
    pub tile: Tile,
    /// Facing
    pub direction: Direction,
    /// Grabber reach (valid 2..=4)
    pub grabber_length: u8,
    /// Converter operation
    pub operation: Operation,
    /// Whether `num` holds a value
    pub has_num: bool,
    /// Payload, emitted value or target value depending on `tile`
    pub num: u16,
    /// Matching deliveries accumulated by an output
    pub score: u8,
    /// Deliveries an output needs before it completes
    pub required_score: u8,
    /// Whether a player may overwrite this cell
    pub editable: bool,
    /// Converter left-hand operand is latched
    pub has_lhs: bool,
    /// Converter left-hand operand
    pub lhs: u16,
    /// Converter right-hand operand is latched
    pub has_rhs: bool,
    /// Converter right-hand operand
    pub rhs: u16,
}

impl Default for TileProperties {
    fn default() -> Self {
        Self {
            tile: Tile::None,
            direction: Direction::Up,
            grabber_length: MIN_GRABBER_LENGTH,
            operation: Operation::Add,
            has_num: false,
            num: 0,
            score: 0,
            required_score: 0,
            editable: true,
            has_lhs: false,
            lhs: 0,
            has_rhs: false,
            rhs: 0,
        }
    }
}

impl TileProperties {
    /// Creates normalized properties for a tile type.
    #[must_use]
    pub fn new(tile: Tile) -> Self {
        let mut props = Self::default();
        props.set_tile(tile);
        props
    }

    /// Changes the tile type, recomputing the derived `editable` and
    /// `has_num` flags.
    pub fn set_tile(&mut self, tile: Tile) {
        self.tile = tile;
        self.editable = tile.is_editable();
        self.has_num = tile.carries_number();
    }

    /// Returns the properties with a direction set.
    #[must_use]
    pub const fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Returns the properties with a number set.
    #[must_use]
    pub const fn with_num(mut self, num: u16) -> Self {
        self.num = num;
        self
    }

    /// Returns the properties with a converter operation set.
    #[must_use]
    pub const fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    /// Returns the properties with a grabber reach set.
    #[must_use]
    pub const fn with_grabber_length(mut self, length: u8) -> Self {
        self.grabber_length = length;
        self
    }

    /// Returns the properties with an output goal set.
    #[must_use]
    pub const fn with_required_score(mut self, required: u8) -> Self {
        self.required_score = required;
        self
    }

    /// Returns the properties carrying a payload.
    ///
    /// Used to build simulation state directly; editor placement strips it.
    #[must_use]
    pub const fn carrying(mut self, payload: u16) -> Self {
        self.has_num = true;
        self.num = payload;
        self
    }

    /// Editor-facing normalization applied on placement.
    ///
    /// Recomputes `editable` and `has_num` from the type, clamps the
    /// configurable ranges and clears converter latches.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.set_tile(self.tile);
        self.grabber_length = self
            .grabber_length
            .clamp(MIN_GRABBER_LENGTH, MAX_GRABBER_LENGTH);
        self.num = self.num.min(NUM_MAX);
        self.has_lhs = false;
        self.lhs = 0;
        self.has_rhs = false;
        self.rhs = 0;
        if self.tile != Tile::Output {
            self.score = 0;
        }
        self
    }

    /// Whether the cell is a carrier holding a payload.
    #[must_use]
    pub const fn is_carrying(&self) -> bool {
        self.tile.is_carrier() && self.has_num
    }

    /// Whether the cell offers a payload to a taker.
    #[must_use]
    pub const fn offers(&self) -> bool {
        matches!(self.tile, Tile::Input) || self.is_carrying()
    }

    /// Whether an output has reached its goal.
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        self.score >= self.required_score
    }

    /// Grabber reach used by the tick, capped at [`MAX_GRABBER_LENGTH`].
    #[must_use]
    pub fn reach(&self) -> u8 {
        self.grabber_length.min(MAX_GRABBER_LENGTH)
    }
}
