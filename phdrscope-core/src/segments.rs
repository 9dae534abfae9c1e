pub mod flags;
pub use flags::*;

use crate::error::{ParseError, Region, Result};
use crate::field::{self, Record};
use goblin::elf::program_header::{
    PT_DYNAMIC, PT_GNU_STACK, PT_HIPROC, PT_INTERP, PT_LOAD, PT_LOPROC, PT_NOTE, PT_NULL, PT_PHDR,
};
use goblin::elf64::program_header::SIZEOF_PHDR;
use std::borrow::Cow;
use std::fmt;

// Field offsets inside `Elf64_Phdr`.
const P_TYPE: usize = 0;
const P_FLAGS: usize = 4;
const P_OFFSET: usize = 8;
const P_VADDR: usize = 16;
const P_PADDR: usize = 24;
const P_FILESZ: usize = 32;
const P_MEMSZ: usize = 40;
const P_ALIGN: usize = 48;

/// One decoded `Elf64_Phdr` entry, uninterpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramHeader {
    pub p_type: u32,
    pub p_flags: u32,
    pub p_offset: u64,
    pub p_vaddr: u64,
    pub p_paddr: u64,
    pub p_filesz: u64,
    pub p_memsz: u64,
    pub p_align: u64,
}

impl ProgramHeader {
    fn decode(rec: Record<'_>) -> Self {
        ProgramHeader {
            p_type: rec.u32(P_TYPE),
            p_flags: rec.u32(P_FLAGS),
            p_offset: rec.u64(P_OFFSET),
            p_vaddr: rec.u64(P_VADDR),
            p_paddr: rec.u64(P_PADDR),
            p_filesz: rec.u64(P_FILESZ),
            p_memsz: rec.u64(P_MEMSZ),
            p_align: rec.u64(P_ALIGN),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Null,
    Loadable,
    Dynamic,
    Interpreter,
    ProgramHeaderTable,
    Note,
    GnuStack,
    /// `PT_LOPROC..=PT_HIPROC`, treated as one opaque category.
    ProcessorReserved(u32),
    Other(u32),
}

impl SegmentKind {
    pub fn classify(p_type: u32) -> Self {
        match p_type {
            PT_LOPROC..=PT_HIPROC => SegmentKind::ProcessorReserved(p_type),
            PT_NULL => SegmentKind::Null,
            PT_LOAD => SegmentKind::Loadable,
            PT_DYNAMIC => SegmentKind::Dynamic,
            PT_INTERP => SegmentKind::Interpreter,
            PT_PHDR => SegmentKind::ProgramHeaderTable,
            PT_NOTE => SegmentKind::Note,
            PT_GNU_STACK => SegmentKind::GnuStack,
            other => SegmentKind::Other(other),
        }
    }

    /// Long-form description used by the text report.
    pub fn description(self) -> &'static str {
        match self {
            SegmentKind::Null => "[PT_NULL] unused",
            SegmentKind::Loadable => "[PT_LOAD] loadable segment",
            SegmentKind::Dynamic => "[PT_DYNAMIC] dynamic linking information",
            SegmentKind::Interpreter => {
                "[PT_INTERP] location and size of a null-terminated pathname to invoke as an interpreter"
            }
            SegmentKind::ProgramHeaderTable => {
                "[PT_PHDR] location and size of the program header table itself"
            }
            SegmentKind::Note => "[PT_NOTE] The array element specifies the location of notes",
            SegmentKind::GnuStack => {
                "[PT_GNU_STACK] GNU extension which is used by the Linux kernel to control the state \
                 of the stack via the flags set in the p_flags member"
            }
            SegmentKind::ProcessorReserved(_) => "reserved for processor-specific semantics",
            SegmentKind::Other(_) => "some other segment",
        }
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentKind::Null => f.write_str("NULL"),
            SegmentKind::Loadable => f.write_str("LOAD"),
            SegmentKind::Dynamic => f.write_str("DYNAMIC"),
            SegmentKind::Interpreter => f.write_str("INTERP"),
            SegmentKind::ProgramHeaderTable => f.write_str("PHDR"),
            SegmentKind::Note => f.write_str("NOTE"),
            SegmentKind::GnuStack => f.write_str("GNU_STACK"),
            SegmentKind::ProcessorReserved(code) => write!(f, "LOPROC+{:#x}", code - PT_LOPROC),
            SegmentKind::Other(code) => write!(f, "{code:#x}"),
        }
    }
}

/// Interpreter path bytes borrowed from the image, exactly `p_filesz` long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interpreter<'a>(&'a [u8]);

impl<'a> Interpreter<'a> {
    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    pub fn to_string_lossy(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.0)
    }
}

impl fmt::Display for Interpreter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

/// A classified program header table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub index: u16,
    pub header: ProgramHeader,
    pub kind: SegmentKind,
    /// Only set for loadable segments.
    pub flags: Option<SegmentFlags>,
    /// Only set for interpreter segments.
    pub interpreter: Option<Interpreter<'a>>,
}

/// Walks a program header table, yielding one result per entry.
///
/// The walk ends after the first error: a truncated table is not recoverable, so no entry past
/// it is attempted.
#[derive(Debug, Clone)]
pub struct ProgramHeaders<'a> {
    bytes: &'a [u8],
    offset: u64,
    count: u16,
    next: u16,
    failed: bool,
}

impl<'a> ProgramHeaders<'a> {
    pub fn new(bytes: &'a [u8], offset: u64, count: u16) -> Self {
        ProgramHeaders { bytes, offset, count, next: 0, failed: false }
    }

    /// Entry size used for every 64-bit table, whatever `e_phentsize` declares.
    pub const ENTRY_SIZE: usize = SIZEOF_PHDR;

    fn decode(&self, index: u16) -> Result<Segment<'a>> {
        let start = self.offset.saturating_add(u64::from(index) * Self::ENTRY_SIZE as u64);
        let rec = field::record(self.bytes, start, Self::ENTRY_SIZE, Region::ProgramHeader(index))?;
        let header = ProgramHeader::decode(rec);
        let kind = SegmentKind::classify(header.p_type);

        let mut segment = Segment { index, header, kind, flags: None, interpreter: None };
        match kind {
            SegmentKind::Loadable => segment.flags = Some(SegmentFlags::from_bits(header.p_flags)),
            SegmentKind::Interpreter => {
                let path = field::slice(
                    self.bytes,
                    header.p_offset,
                    header.p_filesz,
                    Region::Interpreter(index),
                )?;
                segment.interpreter = Some(Interpreter(path));
            }
            SegmentKind::ProcessorReserved(code) => {
                log::debug!("Program header #{index}: processor-specific type {code:#x}, not interpreted");
            }
            _ => {}
        }
        Ok(segment)
    }
}

impl<'a> Iterator for ProgramHeaders<'a> {
    type Item = Result<Segment<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next >= self.count {
            return None;
        }

        let index = self.next;
        self.next += 1;

        let result = self.decode(index);
        if let Err(err) = &result {
            log::warn!("Stopping program header walk at entry #{index}: {err}");
            self.failed = true;
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            (0, Some(usize::from(self.count - self.next)))
        }
    }
}

impl std::iter::FusedIterator for ProgramHeaders<'_> {}

/// Where a program header walk stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncation {
    pub index: u16,
    pub error: ParseError,
}

/// Every entry decoded before the walk ended, in table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentTable<'a> {
    pub segments: Vec<Segment<'a>>,
    /// Set when an entry failed to decode; `segments` then holds the entries before it.
    pub stopped: Option<Truncation>,
}

impl<'a> SegmentTable<'a> {
    pub fn collect(headers: ProgramHeaders<'a>) -> Self {
        let mut segments = Vec::new();
        let mut stopped = None;
        for result in headers {
            match result {
                Ok(segment) => segments.push(segment),
                Err(error) => {
                    stopped = Some(Truncation { index: segments.len() as u16, error });
                }
            }
        }
        SegmentTable { segments, stopped }
    }

    pub fn is_complete(&self) -> bool {
        self.stopped.is_none()
    }
}
