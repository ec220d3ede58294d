//! Error types for Math Machine.

use thiserror::Error;

/// Top-level error type for Math Machine operations.
#[derive(Debug, Error)]
pub enum MathMachineError {
    /// Bit-field specification errors
    #[error("Pixel layout error: {0}")]
    Spec(#[from] SpecParseError),

    /// Level transport errors
    #[error("Level error: {0}")]
    Level(#[from] LevelError),

    /// Grid access errors
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    /// Checked encoding errors
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingOverflow),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while parsing the shared bit-field specification text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecParseError {
    /// No `//METAPROGRAMMING_START ... //METAPROGRAMMING_END` block found
    #[error("no layout block found between the start and end markers")]
    MissingBlock,

    /// A declaration did not have five arguments
    #[error("line {line}: expected 5 arguments, found {found}")]
    Arity {
        /// Line number within the block (1-based)
        line: usize,
        /// Number of arguments found
        found: usize,
    },

    /// Channel letter was not one of `r`, `g`, `b`, `a`
    #[error("line {line}: unknown channel `{channel}`")]
    UnknownChannel {
        /// Line number within the block (1-based)
        line: usize,
        /// The offending channel text
        channel: String,
    },

    /// A bit position could not be parsed
    #[error("line {line}: invalid bit position `{text}`")]
    InvalidBit {
        /// Line number within the block (1-based)
        line: usize,
        /// The offending bit text
        text: String,
    },

    /// The bit range was empty, started at zero, or ran past bit 32
    #[error("line {line}: invalid bit range {start}..={end}")]
    InvalidRange {
        /// Line number within the block (1-based)
        line: usize,
        /// Start bit (1-based)
        start: u32,
        /// End bit (1-based, inclusive)
        end: u32,
    },

    /// The field name was empty once its prefix was removed
    #[error("line {line}: empty field name")]
    EmptyName {
        /// Line number within the block (1-based)
        line: usize,
    },

    /// The same field was declared twice
    #[error("field `{0}` declared more than once")]
    DuplicateField(String),
}

/// Level transport errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    /// Width, height or data length were inconsistent
    #[error("malformed level: {0}")]
    Malformed(String),
}

/// Grid access errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    /// A read or placement targeted a cell outside the grid
    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        /// X coordinate
        x: i32,
        /// Y coordinate
        y: i32,
        /// Grid width
        width: u32,
        /// Grid height
        height: u32,
    },
}

/// A field value did not fit its bit window.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field `{field}` value {value} does not fit in {width} bits")]
pub struct EncodingOverflow {
    /// Field name
    pub field: String,
    /// Value that was rejected
    pub value: u32,
    /// Width of the field in bits
    pub width: u32,
}

/// Result type alias for Math Machine operations.
pub type MathMachineResult<T> = Result<T, MathMachineError>;
