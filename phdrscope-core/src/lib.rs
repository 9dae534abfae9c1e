pub mod binary;
pub mod error;
mod field;
pub mod header;
pub mod object_type;
pub mod segments;

pub use binary::*;
pub use error::*;
pub use header::ident::{Class, Identification};
pub use header::Header;
pub use object_type::ObjectType;
pub use segments::*;
