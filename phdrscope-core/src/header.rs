pub mod elf;
pub mod ident;

use crate::header::ident::Class;
use crate::object_type::ObjectType;

pub trait Header: std::fmt::Debug + Send + Sync {
    /// Returns the virtual address of the entry point.
    fn entry_point(&self) -> u64;

    /// Returns the machine architecture identifier.
    fn machine(&self) -> u16;

    /// Returns the architecture class recorded in the identification bytes.
    fn class(&self) -> Class;

    /// Returns a short human-readable name, e.g. "ELF64".
    fn format_name(&self) -> &'static str;

    /// Returns the classified object file type.
    fn object_type(&self) -> ObjectType;

    /// Returns the number of entries declared for the program header table.
    fn program_header_count(&self) -> u16;
}
