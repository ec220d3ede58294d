//! Level transport: grid contents to and from a flat record.
//!
//! A [`LevelRecord`] is `{width, height, data}` with `data` holding four raw
//! channel values per cell in row-major order. Raw values are copied
//! verbatim in both directions, so even corrupt fields round-trip.

use mathmachine_common::LevelError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::buffer::GridStore;
use crate::codec::Pixel;
use crate::layout::CHANNELS;

/// Serializable form of a level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRecord {
    /// Grid width in cells
    pub width: u32,
    /// Grid height in cells
    pub height: u32,
    /// Row-major channel values, [`CHANNELS`] per cell
    pub data: Vec<u32>,
}

impl LevelRecord {
    /// A level of `width * height` all-zero cells.
    #[must_use]
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * CHANNELS],
        }
    }

    /// Checks dimensions against the data length.
    pub fn validate(&self) -> Result<usize, LevelError> {
        if self.width == 0 || self.height == 0 {
            return Err(LevelError::Malformed(format!(
                "dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        let cells = (self.width as usize)
            .checked_mul(self.height as usize)
            .ok_or_else(|| LevelError::Malformed("level dimensions overflow".to_string()))?;
        let expected = cells
            .checked_mul(CHANNELS)
            .ok_or_else(|| LevelError::Malformed("level dimensions overflow".to_string()))?;
        if self.data.len() != expected {
            return Err(LevelError::Malformed(format!(
                "{}x{} level needs {} values, got {}",
                self.width,
                self.height,
                expected,
                self.data.len()
            )));
        }
        Ok(cells)
    }

    /// Parses the JSON text form.
    ///
    /// Missing, negative or fractional fields are rejected as malformed.
    pub fn from_json(text: &str) -> Result<Self, LevelError> {
        let record: Self = serde_json::from_str(text)
            .map_err(|e| LevelError::Malformed(format!("invalid level JSON: {e}")))?;
        record.validate()?;
        Ok(record)
    }

    /// Renders the JSON text form.
    pub fn to_json(&self) -> Result<String, LevelError> {
        serde_json::to_string(self)
            .map_err(|e| LevelError::Malformed(format!("failed to encode level: {e}")))
    }
}

/// Captures the current generation of `grid`.
#[must_use]
pub fn serialize(grid: &GridStore) -> LevelRecord {
    let data: &[u32] = bytemuck::cast_slice(grid.current());
    debug!(
        "Serialized {}x{} level ({} values)",
        grid.width(),
        grid.height(),
        data.len()
    );
    LevelRecord {
        width: grid.width(),
        height: grid.height(),
        data: data.to_vec(),
    }
}

/// Builds a grid from a record.
///
/// Both generations start with the record's pixels.
pub fn deserialize(record: &LevelRecord) -> Result<GridStore, LevelError> {
    record.validate()?;
    let pixels: &[Pixel] = bytemuck::try_cast_slice(&record.data)
        .map_err(|e| LevelError::Malformed(format!("level data is not pixel aligned: {e}")))?;
    info!("Loaded {}x{} level", record.width, record.height);
    GridStore::with_pixels(record.width, record.height, pixels.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode};
    use crate::layout::PixelSpec;
    use crate::tile::{Tile, TileProperties};
    use mathmachine_common::GridCoord;

    #[test]
    fn test_round_trip_keeps_raw_bits() {
        let spec = PixelSpec::standard().expect("standard layout parses");
        let mut grid = GridStore::new(3, 2, encode(&TileProperties::default(), spec));
        grid.set_pixel(
            GridCoord::new(2, 1),
            encode(&TileProperties::new(Tile::Input).with_num(12), spec),
        )
        .expect("in bounds");
        // Unknown type bits and garbage above every field.
        let corrupt = Pixel::new(0xFFFF_FFF9, 0xDEAD_BEEF, 0xFFFF_0000, 0x8000_0001);
        grid.set_pixel(GridCoord::new(0, 0), corrupt)
            .expect("in bounds");

        let record = serialize(&grid);
        assert_eq!(record.data.len(), 3 * 2 * CHANNELS);
        assert_eq!(&record.data[..4], &[0xFFFF_FFF9, 0xDEAD_BEEF, 0xFFFF_0000, 0x8000_0001]);

        let restored = deserialize(&record).expect("valid record");
        assert_eq!(restored.current(), grid.current());
        let input = decode(
            &restored.pixel(GridCoord::new(2, 1)).expect("in bounds"),
            spec,
        );
        assert_eq!(input.num, 12);
    }

    #[test]
    fn test_rejects_mismatched_lengths() {
        let mut record = LevelRecord::blank(2, 2);
        record.data.pop();
        assert!(matches!(deserialize(&record), Err(LevelError::Malformed(_))));

        let zero = LevelRecord {
            width: 0,
            height: 4,
            data: Vec::new(),
        };
        assert!(deserialize(&zero).is_err());

        let huge = LevelRecord {
            width: u32::MAX,
            height: u32::MAX,
            data: Vec::new(),
        };
        assert!(huge.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let record = LevelRecord {
            width: 1,
            height: 1,
            data: vec![1, 2, 3, 4],
        };
        let text = record.to_json().expect("encodes");
        assert_eq!(text, r#"{"width":1,"height":1,"data":[1,2,3,4]}"#);
        assert_eq!(LevelRecord::from_json(&text).expect("parses"), record);
    }

    #[test]
    fn test_json_rejects_bad_fields() {
        for text in [
            r#"{"width":-1,"height":1,"data":[0,0,0,0]}"#,
            r#"{"width":1.5,"height":1,"data":[0,0,0,0]}"#,
            r#"{"height":1,"data":[0,0,0,0]}"#,
            r#"{"width":1,"height":1,"data":[0,0,-3,0]}"#,
            r#"{"width":1,"height":1,"data":[0,0,0]}"#,
            "not json",
        ] {
            assert!(
                matches!(LevelRecord::from_json(text), Err(LevelError::Malformed(_))),
                "{text}"
            );
        }
    }
}
