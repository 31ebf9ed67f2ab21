//! Cheap structural checks on an ELF header taken straight from an untrusted
//! byte stream, before anything commits to a full parse.

use std::io::Read;

use crate::error::{FormatError, Result, StructuralError};
use crate::header::{Header, Ident, EI_NIDENT, ELF64_EHDR_SIZE};

/// Validates the ELF identification and file header at the start of `r`.
///
/// At most 64 bytes are consumed from `r`, however long it is. The checks
/// short-circuit on the first failure.
pub fn validate_header_bytes<R: Read>(r: R) -> Result<()> {
    read_header(r).map(|_| ())
}

/// A header that passed every check in [`validate_header_bytes`].
#[derive(Debug)]
pub struct CheckedHeader {
    pub ident: Ident,
    pub header: Box<dyn Header>,
}

/// Like [`validate_header_bytes`] but hands back the decoded header.
pub fn read_header<R: Read>(r: R) -> Result<CheckedHeader> {
    let mut buf = Vec::with_capacity(ELF64_EHDR_SIZE);
    r.take(ELF64_EHDR_SIZE as u64).read_to_end(&mut buf)?;
    log::trace!("read {} header bytes", buf.len());

    let e_ident: &[u8; EI_NIDENT] = buf
        .get(..EI_NIDENT)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::UnexpectedEof))?;
    let ident = Ident::parse(e_ident)?;

    let header = ident.decode_header(&buf)?;
    check_header(&ident, header.as_ref())?;
    Ok(CheckedHeader { ident, header })
}

fn check_header(ident: &Ident, header: &dyn Header) -> Result<()> {
    if header.version() != ident.version as u32 {
        return Err(FormatError::VersionMismatch {
            ident: ident.version,
            header: header.version(),
        }
        .into());
    }

    let shoff = header.section_table_offset();
    let shnum = header.section_count();
    let shstrndx = header.string_table_index();

    if shoff == 0 && shnum != 0 {
        return Err(StructuralError::MissingSectionTable { shnum }.into());
    }
    if shnum > 0 && shstrndx >= shnum {
        return Err(StructuralError::StringTableOutOfBounds { shstrndx, shnum }.into());
    }
    if shnum == 0 {
        return Err(StructuralError::NoSections.into());
    }

    log::debug!(
        "header ok: {}-bit, {} sections at {:#x}",
        if header.is_64() { 64 } else { 32 },
        shnum,
        shoff
    );
    Ok(())
}
