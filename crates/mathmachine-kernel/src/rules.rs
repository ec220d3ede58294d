//! Tile rule set: the per-cell update function.
//!
//! [`next_pixel`] computes one cell of the next generation from the
//! previous generation only. Every payload transfer is decided twice, once
//! by the cell giving it up and once by the cell taking it, and both sides
//! evaluate the same pure predicates on the same input. A payload therefore
//! moves exactly when both sides agree, with no cross-cell writes.
//!
//! Transfer priority for a payload held by a carrier:
//! 1. the nearest empty grabber scanning it (ties: UP, DOWN, LEFT, RIGHT);
//! 2. otherwise the cell on its out side, if that cell accepts the push.
//!
//! INPUT tiles are inexhaustible and emit only from the side they face.
//! Every taker on that side gets its own copy, so no arbitration is needed.

use mathmachine_common::GridCoord;

use crate::codec::{decode, encode, Pixel};
use crate::layout::PixelSpec;
use crate::tile::{Direction, Tile, TileProperties, MAX_GRABBER_LENGTH};

/// Read-only view of the previous generation.
#[derive(Clone, Copy)]
pub struct Neighborhood<'a> {
    pixels: &'a [Pixel],
    width: u32,
    height: u32,
    spec: &'a PixelSpec,
}

impl<'a> Neighborhood<'a> {
    /// Wraps a row-major generation.
    #[must_use]
    pub fn new(pixels: &'a [Pixel], width: u32, height: u32, spec: &'a PixelSpec) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        Self {
            pixels,
            width,
            height,
            spec,
        }
    }

    /// Raw pixel at `coord`; outside the grid reads as [`Pixel::EMPTY`].
    #[must_use]
    pub fn raw(&self, coord: GridCoord) -> Pixel {
        coord
            .to_index(self.width, self.height)
            .and_then(|index| self.pixels.get(index).copied())
            .unwrap_or(Pixel::EMPTY)
    }

    /// Decoded properties at `coord`.
    #[must_use]
    pub fn get(&self, coord: GridCoord) -> TileProperties {
        decode(&self.raw(coord), self.spec)
    }

    /// Cell a carrier pushes its payload into, if it is carrying.
    fn push_target(coord: GridCoord, cell: &TileProperties) -> Option<GridCoord> {
        if !cell.is_carrying() {
            return None;
        }
        match cell.tile {
            Tile::Conveyor | Tile::Converter => Some(cell.direction.advance(coord, 1)),
            Tile::Grabber => Some(cell.direction.opposite().advance(coord, 1)),
            _ => None,
        }
    }

    /// First offering cell an empty grabber sees along its facing.
    fn grabber_scan(&self, coord: GridCoord, grabber: &TileProperties) -> Option<GridCoord> {
        if grabber.tile != Tile::Grabber || grabber.has_num {
            return None;
        }
        (1..=i32::from(grabber.reach()))
            .map(|k| grabber.direction.advance(coord, k))
            .find(|&cell| self.get(cell).offers())
    }

    /// The grabber that takes the payload held at `source` this tick.
    ///
    /// Nearest grabber wins; equal distances resolve in [`Direction::ALL`]
    /// order.
    fn grabber_claimant(&self, source: GridCoord) -> Option<GridCoord> {
        for k in 1..=i32::from(MAX_GRABBER_LENGTH) {
            for direction in Direction::ALL {
                let candidate = direction.opposite().advance(source, k);
                let cell = self.get(candidate);
                if cell.tile == Tile::Grabber
                    && cell.direction == direction
                    && self.grabber_scan(candidate, &cell) == Some(source)
                {
                    return Some(candidate);
                }
            }
        }
        None
    }

    /// Whether `source` hands a payload to its neighbour `target` by a plain
    /// push: an INPUT facing `target`, or an unclaimed carrier pushing into it.
    fn emits_to(&self, source: GridCoord, target: GridCoord) -> bool {
        let cell = self.get(source);
        if cell.tile == Tile::Input {
            return cell.direction.advance(source, 1) == target;
        }
        Self::push_target(source, &cell) == Some(target) && self.grabber_claimant(source).is_none()
    }

    /// The neighbour an output or empty grabber takes a push from this tick.
    fn push_supplier(&self, target: GridCoord) -> Option<GridCoord> {
        Direction::ALL
            .into_iter()
            .map(|direction| direction.advance(target, 1))
            .find(|&neighbour| self.emits_to(neighbour, target))
    }

    /// Payload an empty grabber lifts through its scan this tick.
    ///
    /// An INPUT is only copied when the grabber looks at the side it emits
    /// from.
    fn grabber_take(&self, coord: GridCoord, grabber: &TileProperties) -> Option<u16> {
        let target = self.grabber_scan(coord, grabber)?;
        let found = self.get(target);
        let takes = if found.tile == Tile::Input {
            found.direction == grabber.direction.opposite()
        } else {
            self.grabber_claimant(target) == Some(coord)
        };
        takes.then_some(found.num)
    }

    /// Whether `target` takes the push coming from `source`.
    fn accepts_push(&self, target: GridCoord, source: GridCoord) -> bool {
        let cell = self.get(target);
        match cell.tile {
            Tile::Conveyor => !cell.has_num && cell.direction.opposite().advance(target, 1) == source,
            Tile::Converter => operand_side(target, &cell, source)
                .is_some_and(|side| !side.is_latched(&cell)),
            Tile::Grabber => {
                !cell.has_num
                    && self.grabber_take(target, &cell).is_none()
                    && self.push_supplier(target) == Some(source)
            },
            Tile::Output => !cell.is_satisfied() && self.push_supplier(target) == Some(source),
            _ => false,
        }
    }

    /// Whether the carrier at `coord` gives its payload away this tick.
    fn releases(&self, coord: GridCoord, cell: &TileProperties) -> bool {
        if !cell.is_carrying() {
            return false;
        }
        if self.grabber_claimant(coord).is_some() {
            return true;
        }
        Self::push_target(coord, cell).is_some_and(|target| self.accepts_push(target, coord))
    }

    /// Payload pushed from `source` into `target` this tick, if any.
    fn pull_from(&self, source: GridCoord, target: GridCoord) -> Option<u16> {
        self.emits_to(source, target).then(|| self.get(source).num)
    }
}

/// Which converter operand a neighbour feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperandSide {
    Lhs,
    Rhs,
}

impl OperandSide {
    fn is_latched(self, cell: &TileProperties) -> bool {
        match self {
            Self::Lhs => cell.has_lhs,
            Self::Rhs => cell.has_rhs,
        }
    }
}

/// Left-hand neighbour feeds `lhs`, right-hand neighbour feeds `rhs`.
fn operand_side(
    converter: GridCoord,
    cell: &TileProperties,
    source: GridCoord,
) -> Option<OperandSide> {
    if cell.direction.rotate_ccw().advance(converter, 1) == source {
        Some(OperandSide::Lhs)
    } else if cell.direction.rotate_cw().advance(converter, 1) == source {
        Some(OperandSide::Rhs)
    } else {
        None
    }
}

/// Computes the next-generation pixel of one cell.
#[must_use]
pub fn next_pixel(hood: &Neighborhood<'_>, coord: GridCoord) -> Pixel {
    let raw = hood.raw(coord);
    let cell = decode(&raw, hood.spec);

    let next = match cell.tile {
        Tile::Conveyor => step_conveyor(hood, coord, cell),
        Tile::Grabber => step_grabber(hood, coord, cell),
        Tile::Converter => step_converter(hood, coord, cell),
        Tile::Output => step_output(hood, coord, cell),
        // NONE (including unrecognized type bits), WALL, INPUT and COMPLETE
        // never change; keep the raw bits untouched.
        Tile::None | Tile::Wall | Tile::Input | Tile::Complete => return raw,
    };

    if next == cell {
        raw
    } else {
        encode(&next, hood.spec)
    }
}

fn drop_payload(mut cell: TileProperties) -> TileProperties {
    cell.has_num = false;
    cell.num = 0;
    cell
}

fn step_conveyor(hood: &Neighborhood<'_>, coord: GridCoord, cell: TileProperties) -> TileProperties {
    if cell.has_num {
        return if hood.releases(coord, &cell) {
            drop_payload(cell)
        } else {
            cell
        };
    }
    let behind = cell.direction.opposite().advance(coord, 1);
    match hood.pull_from(behind, coord) {
        Some(payload) => cell.carrying(payload),
        None => cell,
    }
}

fn step_grabber(hood: &Neighborhood<'_>, coord: GridCoord, cell: TileProperties) -> TileProperties {
    if cell.has_num {
        return if hood.releases(coord, &cell) {
            drop_payload(cell)
        } else {
            cell
        };
    }
    if let Some(payload) = hood.grabber_take(coord, &cell) {
        return cell.carrying(payload);
    }
    match hood.push_supplier(coord) {
        Some(supplier) => cell.carrying(hood.get(supplier).num),
        None => cell,
    }
}

fn step_converter(
    hood: &Neighborhood<'_>,
    coord: GridCoord,
    cell: TileProperties,
) -> TileProperties {
    let mut next = cell;

    if cell.has_num {
        if hood.releases(coord, &cell) {
            next = drop_payload(next);
        }
    } else if cell.has_lhs && cell.has_rhs {
        next = next.carrying(cell.operation.apply(cell.lhs, cell.rhs));
        next.has_lhs = false;
        next.lhs = 0;
        next.has_rhs = false;
        next.rhs = 0;
        return next;
    }

    if !cell.has_lhs {
        let side = cell.direction.rotate_ccw().advance(coord, 1);
        if let Some(value) = hood.pull_from(side, coord) {
            next.has_lhs = true;
            next.lhs = value;
        }
    }
    if !cell.has_rhs {
        let side = cell.direction.rotate_cw().advance(coord, 1);
        if let Some(value) = hood.pull_from(side, coord) {
            next.has_rhs = true;
            next.rhs = value;
        }
    }
    next
}

fn step_output(hood: &Neighborhood<'_>, coord: GridCoord, cell: TileProperties) -> TileProperties {
    if cell.is_satisfied() {
        let mut next = cell;
        next.tile = Tile::Complete;
        return next;
    }
    let Some(supplier) = hood.push_supplier(coord) else {
        return cell;
    };
    let delivered = hood.get(supplier).num;
    let mut next = cell;
    if cell.has_num && delivered == cell.num {
        next.score = cell.score.saturating_add(1);
    }
    next
}

/// Whether a generation satisfies the win condition.
///
/// At least one COMPLETE cell exists and no OUTPUT is left waiting.
#[must_use]
pub fn level_complete(pixels: &[Pixel], spec: &PixelSpec) -> bool {
    let mut any_complete = false;
    for pixel in pixels {
        match decode(pixel, spec).tile {
            Tile::Output => return false,
            Tile::Complete => any_complete = true,
            _ => {}
        }
    }
    any_complete
}
