use crate::error::{ParseError, Region, Result};
use crate::field;
use goblin::elf::header::{
    EI_CLASS, EI_DATA, ELFCLASS32, ELFCLASS64, ELFDATA2MSB, ELFMAG, SELFMAG, SIZEOF_IDENT,
};
use std::fmt;

/// Architecture class from `e_ident[EI_CLASS]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    ThirtyTwoBit,
    SixtyFourBit,
    /// Any code other than `ELFCLASS32`/`ELFCLASS64`. Reported, not rejected.
    Unknown(u8),
}

impl Class {
    pub fn from_code(code: u8) -> Self {
        match code {
            ELFCLASS32 => Class::ThirtyTwoBit,
            ELFCLASS64 => Class::SixtyFourBit,
            other => Class::Unknown(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Class::ThirtyTwoBit => ELFCLASS32,
            Class::SixtyFourBit => ELFCLASS64,
            Class::Unknown(code) => code,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Class::ThirtyTwoBit => "32-bit",
            Class::SixtyFourBit => "64-bit",
            Class::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Class::Unknown(code) => write!(f, "unknown ({code:#x})"),
            known => f.write_str(known.name()),
        }
    }
}

/// The validated `e_ident` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identification {
    pub magic: [u8; SELFMAG],
    pub class: Class,
    /// `e_ident[EI_DATA..]`, carried verbatim.
    pub rest: [u8; SIZEOF_IDENT - EI_DATA],
}

impl Identification {
    /// Checks the length and magic of `bytes` and classifies the architecture.
    ///
    /// The length check comes first, so a short buffer is always `TruncatedInput` even when the
    /// bytes it does have are not the ELF signature.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let rec = field::record(bytes, 0, SIZEOF_IDENT, Region::Identification)?;
        let ident = rec.bytes();

        let mut magic = [0u8; SELFMAG];
        magic.copy_from_slice(&ident[..SELFMAG]);
        if &magic != ELFMAG {
            return Err(ParseError::InvalidMagic { found: magic });
        }

        let class = Class::from_code(rec.u8(EI_CLASS));
        log::debug!("Identification header: class {class}");

        if rec.u8(EI_DATA) == ELFDATA2MSB {
            log::warn!("Big-endian data encoding; fields are decoded as little-endian");
        }

        let mut rest = [0u8; SIZEOF_IDENT - EI_DATA];
        rest.copy_from_slice(&ident[EI_DATA..]);

        Ok(Identification { magic, class, rest })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(class: u8) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[..4].copy_from_slice(b"\x7fELF");
        bytes[4] = class;
        bytes[5] = 1;
        bytes
    }

    #[test]
    fn every_short_buffer_is_truncated() {
        let full = ident(2);
        for len in 0..16 {
            let err = Identification::parse(&full[..len]).unwrap_err();
            assert_eq!(
                err,
                ParseError::TruncatedInput {
                    region: Region::Identification,
                    start: 0,
                    end: 16,
                    available: len,
                }
            );
        }
    }

    #[test]
    fn short_buffer_with_bad_magic_is_still_truncated() {
        assert!(Identification::parse(b"MZ\x90\x00").unwrap_err().is_truncation());
    }

    #[test]
    fn wrong_magic_is_rejected_whatever_follows() {
        for magic in [*b"\x7fELf", *b"\x00ELF", *b"ELF\x7f", [0xff; 4]] {
            for filler in [0x00, 0x02, 0xff] {
                let mut bytes = [filler; 64];
                bytes[..4].copy_from_slice(&magic);
                assert_eq!(
                    Identification::parse(&bytes),
                    Err(ParseError::InvalidMagic { found: magic })
                );
            }
        }
    }

    #[test]
    fn classifies_architecture() {
        assert_eq!(Identification::parse(&ident(1)).unwrap().class, Class::ThirtyTwoBit);
        assert_eq!(Identification::parse(&ident(2)).unwrap().class, Class::SixtyFourBit);
        for code in [0u8, 3, 0x7f, 0xff] {
            assert_eq!(Identification::parse(&ident(code)).unwrap().class, Class::Unknown(code));
        }
    }

    #[test]
    fn keeps_remaining_bytes() {
        let mut bytes = ident(2);
        bytes[7] = 3;
        let parsed = Identification::parse(&bytes).unwrap();
        assert_eq!(parsed.magic, *b"\x7fELF");
        assert_eq!(parsed.rest[0], 1);
        assert_eq!(parsed.rest[2], 3);
    }

    #[test]
    fn class_round_trips_its_code() {
        for code in 0..=u8::MAX {
            assert_eq!(Class::from_code(code).code(), code);
        }
    }
}
