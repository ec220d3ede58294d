//! Pixel codec: [`TileProperties`] to and from packed [`Pixel`]s.
//!
//! Encoding mirrors the GPU-side packing exactly: every field value is
//! shifted to its start bit and *added* into its channel. Nothing is
//! masked, so a value wider than its window carries into the next field and
//! bits pushed past bit 32 are lost. [`encode_checked`] is the opt-in
//! variant that refuses such values instead.

use bytemuck::{Pod, Zeroable};
use mathmachine_common::EncodingOverflow;
use serde::{Deserialize, Serialize};

use crate::layout::{Field, PixelSpec, CHANNELS};
use crate::tile::{Direction, Operation, Tile, TileProperties};

/// One grid cell in storage form: four unsigned channels (r, g, b, a).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Pod, Zeroable,
)]
#[repr(C)]
pub struct Pixel(pub [u32; CHANNELS]);

impl Pixel {
    /// The all-zero pixel. Out-of-bounds reads see this (a `None` tile).
    pub const EMPTY: Self = Self([0; CHANNELS]);

    /// Creates a pixel from raw channel values.
    #[must_use]
    pub const fn new(r: u32, g: u32, b: u32, a: u32) -> Self {
        Self([r, g, b, a])
    }

    /// Raw channel values.
    #[must_use]
    pub const fn channels(&self) -> [u32; CHANNELS] {
        self.0
    }
}

impl TileProperties {
    /// Integer value of a field as it is packed (booleans as 0/1, enums as
    /// their discriminant).
    #[must_use]
    pub fn field_value(&self, field: Field) -> u32 {
        match field {
            Field::Type => self.tile as u32,
            Field::Direction => self.direction as u32,
            Field::GrabberLength => u32::from(self.grabber_length),
            Field::Operation => self.operation as u32,
            Field::Editable => u32::from(self.editable),
            Field::HasNum => u32::from(self.has_num),
            Field::Num => u32::from(self.num),
            Field::Score => u32::from(self.score),
            Field::RequiredScore => u32::from(self.required_score),
            Field::HasLhs => u32::from(self.has_lhs),
            Field::Lhs => u32::from(self.lhs),
            Field::HasRhs => u32::from(self.has_rhs),
            Field::Rhs => u32::from(self.rhs),
        }
    }

    /// Stores an extracted field value.
    fn set_field_value(&mut self, field: Field, value: u32) {
        match field {
            Field::Type => self.tile = Tile::from_bits(value),
            Field::Direction => self.direction = Direction::from_bits(value),
            Field::GrabberLength => self.grabber_length = value as u8,
            Field::Operation => self.operation = Operation::from_bits(value),
            Field::Editable => self.editable = value != 0,
            Field::HasNum => self.has_num = value != 0,
            Field::Num => self.num = value as u16,
            Field::Score => self.score = value as u8,
            Field::RequiredScore => self.required_score = value as u8,
            Field::HasLhs => self.has_lhs = value != 0,
            Field::Lhs => self.lhs = value as u16,
            Field::HasRhs => self.has_rhs = value != 0,
            Field::Rhs => self.rhs = value as u16,
        }
    }

    /// All-zero properties, the starting point of a decode.
    const fn zeroed() -> Self {
        Self {
            tile: Tile::None,
            direction: Direction::Up,
            grabber_length: 0,
            operation: Operation::Add,
            has_num: false,
            num: 0,
            score: 0,
            required_score: 0,
            editable: false,
            has_lhs: false,
            lhs: 0,
            has_rhs: false,
            rhs: 0,
        }
    }
}

/// Packs properties into a pixel without any overflow checking.
#[must_use]
pub fn encode(properties: &TileProperties, spec: &PixelSpec) -> Pixel {
    let mut out = [0u32; CHANNELS];
    for field in Field::ALL {
        if let Some(slot) = spec.slot(field) {
            let shifted = properties.field_value(field).wrapping_shl(slot.shift());
            out[slot.channel] = out[slot.channel].wrapping_add(shifted);
        }
    }
    Pixel(out)
}

/// Packs properties into a pixel, rejecting any value wider than its field.
pub fn encode_checked(
    properties: &TileProperties,
    spec: &PixelSpec,
) -> Result<Pixel, EncodingOverflow> {
    for field in Field::ALL {
        if let Some(slot) = spec.slot(field) {
            let value = properties.field_value(field);
            if !slot.fits(value) {
                return Err(EncodingOverflow {
                    field: field.name().to_string(),
                    value,
                    width: slot.width(),
                });
            }
        }
    }
    Ok(encode(properties, spec))
}

/// Unpacks a pixel. Fields absent from the layout decode as zero.
#[must_use]
pub fn decode(pixel: &Pixel, spec: &PixelSpec) -> TileProperties {
    let mut props = TileProperties::zeroed();
    for field in Field::ALL {
        if let Some(slot) = spec.slot(field) {
            props.set_field_value(field, slot.extract(pixel.0[slot.channel]));
        }
    }
    props
}
