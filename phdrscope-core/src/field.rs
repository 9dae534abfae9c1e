//! Bounds-checked field access over the raw image.
//!
//! Every fixed-size structure is first carved out with [`record`], which is the only place a
//! range is checked against the buffer. Reads inside a [`Record`] then use offsets that are
//! constants of the structure layout and cannot leave it.

use crate::error::{ParseError, Region, Result};
use byteorder::{ByteOrder, LE};

/// Returns `bytes[start..start + len]`, or `TruncatedInput` when any part of it lies past the end.
pub(crate) fn slice(bytes: &[u8], start: u64, len: u64, region: Region) -> Result<&[u8]> {
    let available = bytes.len();
    match start.checked_add(len) {
        Some(end) if end <= available as u64 => Ok(&bytes[start as usize..end as usize]),
        end => {
            let end = end.unwrap_or(u64::MAX);
            log::debug!("{region} out of bounds: {start:#x}..{end:#x} > {available:#x}");
            Err(ParseError::TruncatedInput { region, start, end, available })
        }
    }
}

pub(crate) fn record(bytes: &[u8], start: u64, len: usize, region: Region) -> Result<Record<'_>> {
    slice(bytes, start, len as u64, region).map(Record)
}

/// A slice whose length has already been checked against a structure size.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Record<'a>(&'a [u8]);

impl<'a> Record<'a> {
    pub fn bytes(&self) -> &'a [u8] {
        self.0
    }

    pub fn u8(&self, offset: usize) -> u8 {
        self.0[offset]
    }

    pub fn u16(&self, offset: usize) -> u16 {
        LE::read_u16(&self.0[offset..])
    }

    pub fn u32(&self, offset: usize) -> u32 {
        LE::read_u32(&self.0[offset..])
    }

    pub fn u64(&self, offset: usize) -> u64 {
        LE::read_u64(&self.0[offset..])
    }
}
