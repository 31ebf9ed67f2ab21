use std::path::Path;

use goblin::container::Ctx;
use goblin::elf::section_header::{SHN_XINDEX, SHT_SYMTAB};
use goblin::elf::{Elf, SectionHeader, Symtab};
use goblin::strtab::Strtab;

use crate::error::{Error, Result, StructuralError};
use crate::sections::Section;

/// The raw bytes of an object file on disk.
///
/// The file handle is only held while reading; the bytes live until this
/// value is dropped.
pub struct ObjectData {
    bytes: Vec<u8>,
}

impl ObjectData {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(&path).map_err(|e| Error::Open(e.into()))?;
        log::trace!("read {} bytes from {}", bytes.len(), path.as_ref().display());
        Ok(Self { bytes })
    }

    pub fn parse(&self) -> Result<ObjectFile<'_>> {
        ObjectFile::parse(&self.bytes)
    }
}

/// A partially parsed ELF file.
///
/// Only the file header, the section header table and the section name
/// table are decoded up front. `.symtab` is decoded when
/// [`ObjectFile::symbols`] is called; nothing else is ever touched, so a
/// damaged relocation or dynamic section does not affect the verdicts.
pub struct ObjectFile<'data> {
    bytes: &'data [u8],
    ctx: Ctx,
    elf: Elf<'data>,
    sections: Vec<Section<'data>>,
}

/// A `.symtab` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol<'data> {
    pub name: &'data str,
    pub section_index: usize,
}

impl<'data> ObjectFile<'data> {
    pub fn parse(bytes: &'data [u8]) -> Result<Self> {
        let header = Elf::parse_header(bytes).map_err(Error::Open)?;
        let mut elf = Elf::lazy_parse(header).map_err(Error::Open)?;
        let ctx = Ctx::new(
            header.container().map_err(Error::Open)?,
            header.endianness().map_err(Error::Open)?,
        );

        elf.section_headers =
            SectionHeader::parse(bytes, header.e_shoff as usize, header.e_shnum as usize, ctx)
                .map_err(Error::Open)?;

        let mut shstrndx = header.e_shstrndx as usize;
        if shstrndx == SHN_XINDEX as usize {
            shstrndx = elf
                .section_headers
                .first()
                .map_or(0, |sh| sh.sh_link as usize);
        }
        elf.shdr_strtab = strtab_at(bytes, &elf.section_headers, shstrndx).map_err(Error::Open)?;

        let sections = elf
            .section_headers
            .iter()
            .enumerate()
            .map(|(i, sh)| Section::from_goblin_sh(i, sh, &elf.shdr_strtab))
            .collect::<Vec<_>>();
        log::debug!(
            "parsed {}-bit {} elf with {} sections",
            if elf.is_64 { 64 } else { 32 },
            if elf.little_endian { "LE" } else { "BE" },
            sections.len()
        );
        Ok(Self {
            bytes,
            ctx,
            elf,
            sections,
        })
    }

    pub fn sections(&self) -> &[Section<'data>] {
        &self.sections
    }

    /// First section named exactly `name`.
    pub fn section_by_name(&self, name: &str) -> Option<&Section<'data>> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Decodes `.symtab` and its string table. Files without one yield an
    /// empty list.
    pub fn symbols(&self) -> Result<Vec<Symbol<'data>>> {
        let Some(shdr) = self
            .elf
            .section_headers
            .iter()
            .find(|sh| sh.sh_type == SHT_SYMTAB)
        else {
            return Ok(Vec::new());
        };

        let count = if shdr.sh_entsize == 0 {
            0
        } else {
            shdr.sh_size / shdr.sh_entsize
        };
        shdr.check_size(self.bytes.len()).map_err(Error::Symbols)?;
        let syms = Symtab::parse(self.bytes, shdr.sh_offset as usize, count as usize, self.ctx)
            .map_err(Error::Symbols)?;
        let strtab = strtab_at(self.bytes, &self.elf.section_headers, shdr.sh_link as usize)
            .map_err(Error::Symbols)?;

        Ok(syms
            .iter()
            .map(|sym| Symbol {
                name: strtab.get_at(sym.st_name).unwrap_or(""),
                section_index: sym.st_shndx,
            })
            .collect())
    }

    pub fn is_64(&self) -> bool {
        self.elf.is_64
    }

    pub fn is_little_endian(&self) -> bool {
        self.elf.little_endian
    }

    /// Rejects files that parsed but have no sections at all.
    pub fn validate(&self) -> Result<()> {
        if self.sections.is_empty() {
            return Err(StructuralError::NoSections.into());
        }
        Ok(())
    }
}

fn strtab_at<'data>(
    bytes: &'data [u8],
    section_headers: &[SectionHeader],
    index: usize,
) -> goblin::error::Result<Strtab<'data>> {
    let Some(shdr) = section_headers.get(index) else {
        return Ok(Strtab::default());
    };
    shdr.check_size(bytes.len())?;
    Strtab::parse(bytes, shdr.sh_offset as usize, shdr.sh_size as usize, 0x0)
}

/// Opens `path` and runs [`ObjectFile::validate`] on it.
pub fn validate_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let data = ObjectData::open(path)?;
    data.parse()?.validate()
}
