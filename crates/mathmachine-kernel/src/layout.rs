//! Bit-field layout of a tile pixel.
//!
//! The layout is written down exactly once, as the declaration block in
//! [`PIXEL_LAYOUT_SOURCE`]. Both the codec and any render-side decoder parse
//! that text, so they cannot disagree about where a field lives.
//!
//! Each declaration reads `FIELD(f_name, type, channel, STARTb, ENDb)`:
//! the name loses its two-character prefix, the channel is one of
//! `r`, `g`, `b`, `a`, and bit positions are 1-based and inclusive.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use mathmachine_common::SpecParseError;
use tracing::{debug, info};

/// Marker opening the declaration block.
pub const LAYOUT_START_MARKER: &str = "//METAPROGRAMMING_START";

/// Marker closing the declaration block.
pub const LAYOUT_END_MARKER: &str = "//METAPROGRAMMING_END";

/// Number of channels in a pixel.
pub const CHANNELS: usize = 4;

/// Canonical pixel layout shared by the tick kernel and render decoders.
pub const PIXEL_LAYOUT_SOURCE: &str = r"// Math Machine tile pixel layout (RGBA32UI).
// r: identity, g: payload, b: scoring, a: converter operand latches.
//METAPROGRAMMING_START
FIELD(f_type, uint, r, 1b, 4b)
FIELD(f_direction, uint, r, 5b, 6b)
FIELD(f_grabber_length, uint, r, 7b, 9b)
FIELD(f_operation, uint, r, 10b, 11b)
FIELD(f_editable, bool, r, 12b, 12b)
FIELD(f_has_num, bool, g, 1b, 1b)
FIELD(f_num, uint, g, 2b, 16b)
FIELD(f_score, uint, b, 1b, 8b)
FIELD(f_required_score, uint, b, 9b, 16b)
FIELD(f_has_lhs, bool, a, 1b, 1b)
FIELD(f_lhs, uint, a, 2b, 16b)
FIELD(f_has_rhs, bool, a, 17b, 17b)
FIELD(f_rhs, uint, a, 18b, 32b)
//METAPROGRAMMING_END
";

/// A logical property that the codec knows how to read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Tile type
    Type,
    /// Facing
    Direction,
    /// Grabber reach
    GrabberLength,
    /// Converter operation
    Operation,
    /// Editable flag
    Editable,
    /// Payload/number present
    HasNum,
    /// Payload/number
    Num,
    /// Output score
    Score,
    /// Output goal
    RequiredScore,
    /// Left operand latched
    HasLhs,
    /// Left operand
    Lhs,
    /// Right operand latched
    HasRhs,
    /// Right operand
    Rhs,
}

impl Field {
    /// Number of known fields.
    pub const COUNT: usize = 13;

    /// Every known field.
    pub const ALL: [Field; Self::COUNT] = [
        Field::Type,
        Field::Direction,
        Field::GrabberLength,
        Field::Operation,
        Field::Editable,
        Field::HasNum,
        Field::Num,
        Field::Score,
        Field::RequiredScore,
        Field::HasLhs,
        Field::Lhs,
        Field::HasRhs,
        Field::Rhs,
    ];

    /// Name used in layout declarations.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Direction => "direction",
            Self::GrabberLength => "grabber_length",
            Self::Operation => "operation",
            Self::Editable => "editable",
            Self::HasNum => "has_num",
            Self::Num => "num",
            Self::Score => "score",
            Self::RequiredScore => "required_score",
            Self::HasLhs => "has_lhs",
            Self::Lhs => "lhs",
            Self::HasRhs => "has_rhs",
            Self::Rhs => "rhs",
        }
    }

    /// Looks a field up by its declaration name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Where a field lives inside a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldSlot {
    /// Channel index (0 = r .. 3 = a)
    pub channel: usize,
    /// First bit, 1-based
    pub start: u32,
    /// Last bit, 1-based inclusive
    pub end: u32,
}

impl FieldSlot {
    /// Width of the field in bits.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Right shift that brings the field to bit 0.
    #[must_use]
    pub const fn shift(&self) -> u32 {
        self.start - 1
    }

    /// Mask covering the field once shifted down.
    #[must_use]
    pub const fn mask(&self) -> u32 {
        ((1u64 << self.width()) - 1) as u32
    }

    /// Whether `value` fits in the field without spilling.
    #[must_use]
    pub const fn fits(&self, value: u32) -> bool {
        value & !self.mask() == 0
    }

    /// Reads the field out of a channel value.
    #[must_use]
    pub const fn extract(&self, channel_value: u32) -> u32 {
        (channel_value >> self.shift()) & self.mask()
    }
}

/// Parsed bit-field specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelSpec {
    /// Slots of the fields the codec understands
    known: [Option<FieldSlot>; Field::COUNT],
    /// Every declared field by name, including ones the codec ignores
    declared: BTreeMap<String, FieldSlot>,
}

impl PixelSpec {
    /// The canonical layout parsed from [`PIXEL_LAYOUT_SOURCE`].
    ///
    /// Parsed once per process; an error here is fatal for the caller.
    pub fn standard() -> Result<&'static PixelSpec, SpecParseError> {
        static STANDARD: OnceLock<Result<PixelSpec, SpecParseError>> = OnceLock::new();
        STANDARD
            .get_or_init(|| {
                let spec = parse_spec(PIXEL_LAYOUT_SOURCE);
                if let Ok(spec) = &spec {
                    info!("Pixel layout loaded ({} fields)", spec.len());
                }
                spec
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Slot of a known field, if declared.
    #[must_use]
    pub fn slot(&self, field: Field) -> Option<FieldSlot> {
        self.known[field.index()]
    }

    /// Slot of any declared field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<FieldSlot> {
        self.declared.get(name).copied()
    }

    /// Number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.declared.len()
    }

    /// Whether no fields were declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    /// Iterates declared fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldSlot)> {
        self.declared.iter().map(|(name, slot)| (name.as_str(), *slot))
    }
}

/// Parses the declaration block out of a layout source text.
pub fn parse_spec(source: &str) -> Result<PixelSpec, SpecParseError> {
    let start = source
        .find(LAYOUT_START_MARKER)
        .ok_or(SpecParseError::MissingBlock)?
        + LAYOUT_START_MARKER.len();
    let end = source[start..]
        .find(LAYOUT_END_MARKER)
        .ok_or(SpecParseError::MissingBlock)?
        + start;

    let mut spec = PixelSpec {
        known: [None; Field::COUNT],
        declared: BTreeMap::new(),
    };

    // Declarations start on the line after the start marker.
    let block = source[start..end]
        .split_once('\n')
        .map_or("", |(_, rest)| rest);

    for (offset, line) in block.lines().enumerate() {
        let line_no = offset + 1;
        let Some(args) = declaration_args(line) else {
            continue;
        };
        if args.len() != 5 {
            return Err(SpecParseError::Arity {
                line: line_no,
                found: args.len(),
            });
        }

        let name: String = args[0].chars().skip(2).collect();
        if name.is_empty() {
            return Err(SpecParseError::EmptyName { line: line_no });
        }
        let channel = parse_channel(&args[2], line_no)?;
        let start_bit = parse_bit(&args[3], line_no)?;
        let end_bit = parse_bit(&args[4], line_no)?;
        if start_bit == 0 || start_bit > end_bit || end_bit > 32 {
            return Err(SpecParseError::InvalidRange {
                line: line_no,
                start: start_bit,
                end: end_bit,
            });
        }

        let slot = FieldSlot {
            channel,
            start: start_bit,
            end: end_bit,
        };
        if spec.declared.insert(name.clone(), slot).is_some() {
            return Err(SpecParseError::DuplicateField(name));
        }
        match Field::from_name(&name) {
            Some(field) => spec.known[field.index()] = Some(slot),
            None => debug!("Layout field `{name}` is not used by the codec"),
        }
    }

    Ok(spec)
}

/// Extracts the comma-separated arguments of the first parenthesised group.
fn declaration_args(line: &str) -> Option<Vec<String>> {
    let open = line.find('(')?;
    let close = line[open..].find(')')? + open;
    Some(
        line[open + 1..close]
            .split(',')
            .map(|arg| arg.chars().filter(|c| !c.is_whitespace()).collect())
            .collect(),
    )
}

fn parse_channel(text: &str, line: usize) -> Result<usize, SpecParseError> {
    match text {
        "r" => Ok(0),
        "g" => Ok(1),
        "b" => Ok(2),
        "a" => Ok(3),
        _ => Err(SpecParseError::UnknownChannel {
            line,
            channel: text.to_string(),
        }),
    }
}

fn parse_bit(text: &str, line: usize) -> Result<u32, SpecParseError> {
    text.strip_suffix('b')
        .unwrap_or(text)
        .parse()
        .map_err(|_| SpecParseError::InvalidBit {
            line,
            text: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_layout_declares_every_field() {
        let spec = PixelSpec::standard().expect("standard layout parses");
        assert_eq!(spec.len(), Field::COUNT);
        for field in Field::ALL {
            assert!(spec.slot(field).is_some(), "{field:?} missing");
        }
        let num = spec.slot(Field::Num).expect("num declared");
        assert_eq!((num.channel, num.start, num.end), (1, 2, 16));
        assert_eq!(num.width(), 15);
    }

    #[test]
    fn test_standard_fields_do_not_overlap() {
        let spec = PixelSpec::standard().expect("standard layout parses");
        let mut used = [0u32; CHANNELS];
        for (name, slot) in spec.iter() {
            let bits = slot.mask() << slot.shift();
            assert_eq!(used[slot.channel] & bits, 0, "{name} overlaps");
            used[slot.channel] |= bits;
        }
    }

    #[test]
    fn test_missing_block() {
        assert_eq!(
            parse_spec("FIELD(f_type, uint, r, 1b, 4b)"),
            Err(SpecParseError::MissingBlock)
        );
        let unterminated = format!("{LAYOUT_START_MARKER}\nFIELD(f_type, uint, r, 1b, 4b)\n");
        assert_eq!(parse_spec(&unterminated), Err(SpecParseError::MissingBlock));
    }

    #[test]
    fn test_skips_lines_without_declarations() {
        let source = format!(
            "{LAYOUT_START_MARKER}\n// comment\n\nFIELD( f_num , uint , g , 2b , 16b )\n{LAYOUT_END_MARKER}"
        );
        let spec = parse_spec(&source).expect("parses");
        assert_eq!(spec.len(), 1);
        assert_eq!(
            spec.get("num"),
            Some(FieldSlot {
                channel: 1,
                start: 2,
                end: 16
            })
        );
        assert_eq!(spec.slot(Field::Type), None);
    }

    #[test]
    fn test_unknown_fields_are_kept_but_ignored() {
        let source = format!(
            "{LAYOUT_START_MARKER}\nFIELD(f_glow, uint, a, 1b, 3b)\n{LAYOUT_END_MARKER}"
        );
        let spec = parse_spec(&source).expect("parses");
        assert!(spec.get("glow").is_some());
        assert!(Field::ALL.iter().all(|f| spec.slot(*f).is_none()));
    }

    #[test]
    fn test_parse_errors() {
        let wrap = |body: &str| format!("{LAYOUT_START_MARKER}\n{body}\n{LAYOUT_END_MARKER}");

        assert!(matches!(
            parse_spec(&wrap("FIELD(f_num, g, 2b, 16b)")),
            Err(SpecParseError::Arity { line: 1, found: 4 })
        ));
        assert!(matches!(
            parse_spec(&wrap("FIELD(f_num, uint, x, 2b, 16b)")),
            Err(SpecParseError::UnknownChannel { .. })
        ));
        assert!(matches!(
            parse_spec(&wrap("FIELD(f_num, uint, g, twob, 16b)")),
            Err(SpecParseError::InvalidBit { .. })
        ));
        assert!(matches!(
            parse_spec(&wrap("FIELD(f_num, uint, g, 0b, 16b)")),
            Err(SpecParseError::InvalidRange { .. })
        ));
        assert!(matches!(
            parse_spec(&wrap("FIELD(f_num, uint, g, 9b, 8b)")),
            Err(SpecParseError::InvalidRange { .. })
        ));
        assert!(matches!(
            parse_spec(&wrap("FIELD(f_num, uint, g, 2b, 33b)")),
            Err(SpecParseError::InvalidRange { .. })
        ));
        assert!(matches!(
            parse_spec(&wrap("FIELD(f_, uint, g, 2b, 3b)")),
            Err(SpecParseError::EmptyName { line: 1 })
        ));
        assert_eq!(
            parse_spec(&wrap(
                "FIELD(f_num, uint, g, 2b, 3b)\nFIELD(f_num, uint, b, 2b, 3b)"
            )),
            Err(SpecParseError::DuplicateField("num".to_string()))
        );
    }

    #[test]
    fn test_slot_masks() {
        let full = FieldSlot {
            channel: 3,
            start: 1,
            end: 32,
        };
        assert_eq!(full.mask(), u32::MAX);
        assert!(full.fits(u32::MAX));

        let three = FieldSlot {
            channel: 0,
            start: 7,
            end: 9,
        };
        assert_eq!(three.mask(), 0b111);
        assert!(three.fits(7));
        assert!(!three.fits(8));
        assert_eq!(three.extract(0b1_0100_0000), 0b101);
    }
}
