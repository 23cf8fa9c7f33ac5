use snafu::Snafu;

pub type Result<T, E = CodecError> = ::std::result::Result<T, E>;

/// Everything the codec can reject before a single byte leaves it.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CodecError {
    #[snafu(display("Unknown command '{}'", name))]
    UnknownCommand { name: String },

    #[snafu(display("'{}' is not a valid {} value", name, command))]
    InvalidName { command: String, name: String },

    #[snafu(display("{} value {} is out of bounds [{}..{}]", command, value, min, max))]
    OutOfRange {
        command: String,
        value: i64,
        min: i32,
        max: i32,
    },

    #[snafu(display("{} expects a {} value, got a {}", command, expected, found))]
    WrongValueType {
        command: String,
        expected: &'static str,
        found: &'static str,
    },

    #[snafu(display("Bad color '{}', expected #rrggbb", color))]
    BadColor { color: String },

    #[snafu(display("Color slot {} does not exist, use 0 (primary) or 1 (root)", slot))]
    BadColorSlot { slot: u8 },

    #[snafu(display("Cannot pack a field {} bits wide", width))]
    InvalidWidth { width: u32 },

    #[snafu(display("Payload overflow: {} bits do not fit in 8 groups of 7", bits))]
    PayloadOverflow { bits: u32 },

    #[snafu(display("Topology id {} is not in [0..63]", id))]
    InvalidTopology { id: u8 },
}

/// Coarse classification callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnknownCommand,
    InvalidArgument,
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::UnknownCommand { .. } => ErrorKind::UnknownCommand,
            _ => ErrorKind::InvalidArgument,
        }
    }
}
