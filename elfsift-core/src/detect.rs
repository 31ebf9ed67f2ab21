//! Verdicts a symbolizer needs before resolving addresses in a binary.
//!
//! Each path-taking function opens the file, runs one check and drops it
//! again. The `*_in` variants run against an already parsed [`ObjectFile`].

use std::path::Path;

use crate::binary::{ObjectData, ObjectFile};
use crate::error::{Error, Result};
use crate::sections::{DwarfSection, DwarfSectionSet};

/// Name of the note section the Go linker stamps its build id into.
pub const GO_BUILD_ID_NOTE: &str = ".note.go.buildid";

/// Go's own PC to file/line/function table.
pub const GO_PCLNTAB: &str = ".gopclntab";

/// Symbols that only a Go binary carries.
pub const GO_MARKER_SYMBOLS: [&str; 3] = ["main.main", "runtime.main", "runtime.buildVersion"];

/// Reports whether the file at `path` carries DWARF debug information.
pub fn has_dwarf<P: AsRef<Path>>(path: P) -> Result<bool> {
    let data = ObjectData::open(path)?;
    Ok(has_dwarf_in(&data.parse()?))
}

/// [`has_dwarf`] on an already parsed file.
pub fn has_dwarf_in(obj: &ObjectFile<'_>) -> bool {
    !dwarf_sections(obj).is_empty()
}

/// The recognized DWARF sections present with content in the file.
///
/// Only `abbrev`, `info`, `str`, `line` and `ranges` are considered.
pub fn dwarf_sections(obj: &ObjectFile<'_>) -> DwarfSectionSet {
    obj.sections()
        .iter()
        .filter(|s| s.is_progbits())
        .filter_map(|s| DwarfSection::classify(s.name))
        .collect()
}

/// Reports whether the file at `path` has a `.note.go.buildid` section.
pub fn is_go_obj_file<P: AsRef<Path>>(path: P) -> Result<bool> {
    let data = ObjectData::open(path)?;
    Ok(is_go_obj_file_in(&data.parse()?))
}

/// [`is_go_obj_file`] on an already parsed file.
pub fn is_go_obj_file_in(obj: &ObjectFile<'_>) -> bool {
    obj.section_by_name(GO_BUILD_ID_NOTE).is_some()
}

/// Reports whether the file at `path` was built by Go and can be
/// symbolized from `.gopclntab`.
///
/// Returns `Ok(false)` when the file is not a Go binary, and
/// [`Error::NotSymbolizable`] when it is one but `.gopclntab` is missing or
/// has no bits.
pub fn is_symbolizable_go_obj_file<P: AsRef<Path>>(path: P) -> Result<bool> {
    let data = ObjectData::open(path)?;
    is_symbolizable_go_obj_file_in(&data.parse()?)
}

/// [`is_symbolizable_go_obj_file`] on an already parsed file.
pub fn is_symbolizable_go_obj_file_in(obj: &ObjectFile<'_>) -> Result<bool> {
    // The build id note may have been stripped; the symbols usually survive.
    let is_go = is_go_obj_file_in(obj)
        || obj
            .symbols()?
            .iter()
            .any(|sym| GO_MARKER_SYMBOLS.iter().any(|m| *m == sym.name));
    if !is_go {
        return Ok(false);
    }

    match obj.section_by_name(GO_PCLNTAB) {
        Some(sec) if sec.is_progbits() => Ok(true),
        other => {
            log::debug!("go binary without usable {GO_PCLNTAB}: {other:?}");
            Err(Error::NotSymbolizable)
        }
    }
}

/// Reports whether the file at `path` has `.symtab` or `.dynsym`.
pub fn has_symbols<P: AsRef<Path>>(path: P) -> Result<bool> {
    let data = ObjectData::open(path)?;
    Ok(has_symbols_in(&data.parse()?))
}

/// [`has_symbols`] on an already parsed file.
pub fn has_symbols_in(obj: &ObjectFile<'_>) -> bool {
    obj.sections().iter().any(|s| s.kind.is_symbol_table())
}
