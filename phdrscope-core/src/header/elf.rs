use crate::error::{Region, Result};
use crate::field;
use crate::header::ident::{Class, Identification};
use crate::header::Header;
use crate::object_type::ObjectType;
use goblin::elf64::header::SIZEOF_EHDR;
use goblin::elf64::program_header::SIZEOF_PHDR;

// Field offsets inside `Elf64_Ehdr`.
const E_TYPE: usize = 16;
const E_MACHINE: usize = 18;
const E_ENTRY: usize = 24;
const E_PHOFF: usize = 32;
const E_PHENTSIZE: usize = 54;
const E_PHNUM: usize = 56;

/// The fields of the 64-bit ELF header (`Elf64_Ehdr`) this crate reports on.
///
/// Section header fields, `e_version`, `e_flags` and `e_ehsize` are not decoded.
///
/// Reference: [ELF Specification v1.2](https://refspecs.linuxfoundation.org/elf/elf.pdf)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf64Ehdr {
    pub e_ident: Identification,

    /// Object file type, see [`ObjectType`].
    pub e_type: u16,

    /// Target architecture (e.g. `EM_X86_64` = 62).
    pub e_machine: u16,

    /// Virtual address of the program entry point.
    pub e_entry: u64,

    /// File offset of the program header table.
    pub e_phoff: u64,

    /// Declared size of one program header table entry.
    pub e_phentsize: u16,

    /// Number of entries in the program header table.
    pub e_phnum: u16,
}

impl Elf64Ehdr {
    /// Decodes the header fields following an already validated identification block.
    pub fn parse(bytes: &[u8], e_ident: Identification) -> Result<Self> {
        let rec = field::record(bytes, 0, SIZEOF_EHDR, Region::FileHeader)?;

        let header = Elf64Ehdr {
            e_ident,
            e_type: rec.u16(E_TYPE),
            e_machine: rec.u16(E_MACHINE),
            e_entry: rec.u64(E_ENTRY),
            e_phoff: rec.u64(E_PHOFF),
            e_phentsize: rec.u16(E_PHENTSIZE),
            e_phnum: rec.u16(E_PHNUM),
        };

        if header.e_phnum > 0 && usize::from(header.e_phentsize) != SIZEOF_PHDR {
            log::warn!(
                "e_phentsize is {} but ELF64 program headers are {SIZEOF_PHDR} bytes; using {SIZEOF_PHDR}",
                header.e_phentsize
            );
        }

        Ok(header)
    }
}

impl Header for Elf64Ehdr {
    fn entry_point(&self) -> u64 {
        self.e_entry
    }

    fn machine(&self) -> u16 {
        self.e_machine
    }

    fn class(&self) -> Class {
        self.e_ident.class
    }

    fn format_name(&self) -> &'static str {
        "ELF64"
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::classify(self.e_type)
    }

    fn program_header_count(&self) -> u16 {
        self.e_phnum
    }
}
