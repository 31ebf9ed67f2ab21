//! Error taxonomy shared by the header gate and the detectors.
//!
//! Every error is a deterministic function of the input: running the same
//! check twice on the same bytes yields the same error.

use std::io;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The file could not be read or parsed as ELF at all.
    #[error("failed to open elf: {0}")]
    Open(#[source] goblin::error::Error),

    /// `.symtab` or its string table lies outside the file.
    #[error("failed to read symbols: {0}")]
    Symbols(#[source] goblin::error::Error),

    /// The input stream ran out before the header was complete.
    #[error("failed to read elf header: {0}")]
    Read(#[from] io::Error),

    /// A header field held a value outside its recognized set.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Header fields are individually valid but contradict each other.
    #[error(transparent)]
    Inconsistent(#[from] StructuralError),

    /// The file was built by the Go toolchain but `.gopclntab` is missing
    /// or carries no bits, so it cannot be symbolized natively.
    #[error("failed to detect .gopclntab section or section has no bits")]
    NotSymbolizable,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("invalid magic number, {}", escape(.0))]
    BadMagic([u8; 4]),

    #[error("unknown ELF class, {0}")]
    UnknownClass(u8),

    #[error("unknown ELF data encoding, {0}")]
    UnknownEncoding(u8),

    #[error("unknown ELF version, {0}")]
    UnknownVersion(u8),

    /// `e_version` in the file header disagrees with `EI_VERSION`.
    #[error("invalid ELF version, {header} (identification says {ident})")]
    VersionMismatch { ident: u8, header: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("invalid ELF file, shoff is 0 but shnum is {shnum}")]
    MissingSectionTable { shnum: u16 },

    #[error("invalid ELF file, shstrndx is {shstrndx} but shnum is {shnum}")]
    StringTableOutOfBounds { shstrndx: u16, shnum: u16 },

    #[error("ELF does not have any sections")]
    NoSections,
}

/// Payload-free view of [`Error`], for callers that only branch on the
/// category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Open,
    Symbols,
    Read,
    Format,
    Inconsistent,
    NotSymbolizable,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Open(_) => ErrorKind::Open,
            Error::Symbols(_) => ErrorKind::Symbols,
            Error::Read(_) => ErrorKind::Read,
            Error::Format(_) => ErrorKind::Format,
            Error::Inconsistent(_) => ErrorKind::Inconsistent,
            Error::NotSymbolizable => ErrorKind::NotSymbolizable,
        }
    }
}

fn escape(bytes: &[u8]) -> String {
    bytes.escape_ascii().to_string()
}
