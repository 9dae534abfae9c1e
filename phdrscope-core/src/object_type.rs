use goblin::elf::header::{ET_CORE, ET_DYN, ET_EXEC, ET_NONE, ET_REL};
use std::fmt;

/// Object file type from `e_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    None,
    Relocatable,
    Executable,
    SharedObject,
    Core,
    /// Any other code, including the OS and processor specific ranges.
    Unrecognized(u16),
}

impl ObjectType {
    pub fn classify(code: u16) -> Self {
        match code {
            ET_NONE => ObjectType::None,
            ET_REL => ObjectType::Relocatable,
            ET_EXEC => ObjectType::Executable,
            ET_DYN => ObjectType::SharedObject,
            ET_CORE => ObjectType::Core,
            other => ObjectType::Unrecognized(other),
        }
    }

    pub fn code(self) -> u16 {
        match self {
            ObjectType::None => ET_NONE,
            ObjectType::Relocatable => ET_REL,
            ObjectType::Executable => ET_EXEC,
            ObjectType::SharedObject => ET_DYN,
            ObjectType::Core => ET_CORE,
            ObjectType::Unrecognized(code) => code,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ObjectType::None => "unknown",
            ObjectType::Relocatable => "relocatable file",
            ObjectType::Executable => "executable file",
            ObjectType::SharedObject => "shared object",
            ObjectType::Core => "core file",
            ObjectType::Unrecognized(_) => "unexpected file type",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectType::Unrecognized(code) => write!(f, "{} ({code:#06x})", self.name()),
            known => f.write_str(known.name()),
        }
    }
}
