use goblin::elf::program_header::{PF_R, PF_W, PF_X};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentFlag {
    Execute,
    Write,
    Read,
}

impl SegmentFlag {
    /// Reporting order. Fixed for output compatibility, independent of bit positions.
    pub const ORDER: [SegmentFlag; 3] = [SegmentFlag::Execute, SegmentFlag::Write, SegmentFlag::Read];

    pub fn bit(self) -> u32 {
        match self {
            SegmentFlag::Execute => PF_X,
            SegmentFlag::Write => PF_W,
            SegmentFlag::Read => PF_R,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SegmentFlag::Execute => "EXEC",
            SegmentFlag::Write => "WRITE",
            SegmentFlag::Read => "READ",
        }
    }
}

/// `p_flags` of a loadable segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentFlags(u32);

impl SegmentFlags {
    pub fn from_bits(bits: u32) -> Self {
        SegmentFlags(bits)
    }

    /// The raw mask, including any OS or processor specific bits.
    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, flag: SegmentFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    /// Set flags in reporting order.
    pub fn iter(self) -> impl Iterator<Item = SegmentFlag> {
        SegmentFlag::ORDER.into_iter().filter(move |flag| self.contains(*flag))
    }

    pub fn labels(self) -> Vec<&'static str> {
        self.iter().map(SegmentFlag::label).collect()
    }
}

impl fmt::Display for SegmentFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.labels().join("|"))
    }
}
