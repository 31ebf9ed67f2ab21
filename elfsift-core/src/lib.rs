pub mod binary;
pub mod detect;
pub mod error;
pub mod header;
pub mod sections;
pub mod validate;

pub use binary::*;
pub use detect::*;
pub use error::{Error, ErrorKind, FormatError, Result, StructuralError};
pub use sections::*;
pub use validate::*;
