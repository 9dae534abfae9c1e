use std::fmt;
use thiserror::Error;

/// The part of the image a decode step was reading when it ran out of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// `e_ident`, the leading 16 bytes.
    Identification,
    /// The full `Elf64_Ehdr`.
    FileHeader,
    /// Program header table entry at the given index.
    ProgramHeader(u16),
    /// Interpreter path referenced by the `PT_INTERP` entry at the given index.
    Interpreter(u16),
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Identification => write!(f, "identification header"),
            Region::FileHeader => write!(f, "file header"),
            Region::ProgramHeader(index) => write!(f, "program header #{index}"),
            Region::Interpreter(index) => write!(f, "interpreter path of program header #{index}"),
        }
    }
}

/// Structural failures. Unknown classification codes are never reported here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("truncated input: {region} needs bytes {start:#x}..{end:#x} but the buffer holds {available:#x}")]
    TruncatedInput {
        region: Region,
        start: u64,
        end: u64,
        available: usize,
    },

    #[error("invalid magic {found:02x?}, expected [7f, 45, 4c, 46]")]
    InvalidMagic { found: [u8; 4] },
}

impl ParseError {
    pub fn is_truncation(&self) -> bool {
        matches!(self, ParseError::TruncatedInput { .. })
    }
}

pub type Result<T, E = ParseError> = std::result::Result<T, E>;
