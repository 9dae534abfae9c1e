use crate::error::Result as ParseResult;
use crate::header::elf::Elf64Ehdr;
use crate::header::ident::{Class, Identification};
use crate::header::Header;
use crate::segments::{ProgramHeaders, SegmentTable};
use anyhow::{Context, Result};
use std::io::Read;

/// The whole file, loaded into memory once and never modified.
pub struct Binary {
    pub path: String,
    bytes: Vec<u8>,
}

impl Binary {
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open inspected file {}", path.display()))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        log::info!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(Self::from_bytes(path.display().to_string(), bytes))
    }

    pub fn from_bytes(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { path: path.into(), bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn elf(&self) -> ParseResult<ElfFile<'_>> {
        ElfFile::parse(&self.bytes)
    }
}

/// A validated view over an ELF image.
///
/// Holds the identification block and, for 64-bit images, the decoded file header. Program
/// headers are decoded lazily through [`ElfFile::program_headers`].
#[derive(Debug, Clone, Copy)]
pub struct ElfFile<'a> {
    bytes: &'a [u8],
    ident: Identification,
    header: Option<Elf64Ehdr>,
}

impl<'a> ElfFile<'a> {
    pub fn parse(bytes: &'a [u8]) -> ParseResult<Self> {
        let ident = Identification::parse(bytes)?;

        let header = match ident.class {
            Class::SixtyFourBit => Some(Elf64Ehdr::parse(bytes, ident)?),
            other => {
                log::info!("Class {other} detected; file header is only decoded for 64-bit images");
                None
            }
        };

        Ok(ElfFile { bytes, ident, header })
    }

    pub fn identification(&self) -> &Identification {
        &self.ident
    }

    pub fn class(&self) -> Class {
        self.ident.class
    }

    /// The decoded file header, `None` unless the image is 64-bit.
    pub fn header(&self) -> Option<&dyn Header> {
        self.header.as_ref().map(|h| h as &dyn Header)
    }

    pub fn elf64_header(&self) -> Option<&Elf64Ehdr> {
        self.header.as_ref()
    }

    /// Iterates the program header table. Empty when no file header was decoded.
    pub fn program_headers(&self) -> ProgramHeaders<'a> {
        match &self.header {
            Some(h) => ProgramHeaders::new(self.bytes, h.e_phoff, h.e_phnum),
            None => ProgramHeaders::new(self.bytes, 0, 0),
        }
    }

    pub fn segment_table(&self) -> SegmentTable<'a> {
        SegmentTable::collect(self.program_headers())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ParseError, Region};

    fn image(class: u8) -> Vec<u8> {
        let mut bytes = vec![0u8; 64];
        bytes[..4].copy_from_slice(b"\x7fELF");
        bytes[4] = class;
        bytes[5] = 1;
        bytes[16..18].copy_from_slice(&2u16.to_le_bytes());
        bytes
    }

    #[test]
    fn sixty_four_bit_has_header() {
        let bin = Binary::from_bytes("mem", image(2));
        let elf = bin.elf().unwrap();
        assert_eq!(elf.class(), Class::SixtyFourBit);
        assert_eq!(elf.identification().magic, *b"\x7fELF");
        assert_eq!(elf.header().unwrap().program_header_count(), 0);
        assert!(elf.segment_table().is_complete());
    }

    #[test]
    fn thirty_two_bit_is_detected_not_decoded() {
        let mut bytes = image(1);
        bytes.truncate(16);
        let elf = ElfFile::parse(&bytes).unwrap();
        assert_eq!(elf.class(), Class::ThirtyTwoBit);
        assert!(elf.header().is_none());
        assert_eq!(elf.program_headers().count(), 0);
    }

    #[test]
    fn unknown_class_is_not_an_error() {
        let bytes = image(9);
        let elf = ElfFile::parse(&bytes).unwrap();
        assert_eq!(elf.class(), Class::Unknown(9));
        assert!(elf.elf64_header().is_none());
    }

    #[test]
    fn short_sixty_four_bit_header_is_truncated() {
        let bytes = image(2);
        let err = ElfFile::parse(&bytes[..32]).unwrap_err();
        assert!(matches!(err, ParseError::TruncatedInput { region: Region::FileHeader, .. }));
    }

    #[test]
    fn open_missing_file_fails() {
        assert!(Binary::open("/nonexistent/phdrscope/input").is_err());
    }
}
