use std::fmt;

use goblin::elf::section_header::{SHT_DYNSYM, SHT_NOTE, SHT_PROGBITS, SHT_SYMTAB};
use goblin::elf::SectionHeader;
use goblin::strtab::Strtab;

/// Storage kind of a section, reduced to the cases the detectors care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// `SHT_PROGBITS`: content is present in the file.
    ProgBits,
    Note,
    SymTab,
    DynSym,
    /// Any other `sh_type`, kept raw.
    Other(u32),
}

impl SectionKind {
    pub fn from_sh_type(sh_type: u32) -> Self {
        match sh_type {
            SHT_PROGBITS => SectionKind::ProgBits,
            SHT_NOTE => SectionKind::Note,
            SHT_SYMTAB => SectionKind::SymTab,
            SHT_DYNSYM => SectionKind::DynSym,
            other => SectionKind::Other(other),
        }
    }

    pub fn is_symbol_table(self) -> bool {
        matches!(self, SectionKind::SymTab | SectionKind::DynSym)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKind::ProgBits => f.write_str("PROGBITS"),
            SectionKind::Note => f.write_str("NOTE"),
            SectionKind::SymTab => f.write_str("SYMTAB"),
            SectionKind::DynSym => f.write_str("DYNSYM"),
            SectionKind::Other(t) => write!(f, "0x{t:x}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'data> {
    pub index: usize,
    /// Not guaranteed unique within a file.
    pub name: &'data str,
    pub kind: SectionKind,
    pub size: u64,
}

impl<'data> Section<'data> {
    pub fn from_goblin_sh(index: usize, sh: &SectionHeader, shdr_strtab: &Strtab<'data>) -> Self {
        Section {
            index,
            name: shdr_strtab.get_at(sh.sh_name).unwrap_or(""),
            kind: SectionKind::from_sh_type(sh.sh_type),
            size: sh.sh_size,
        }
    }

    pub fn is_progbits(&self) -> bool {
        self.kind == SectionKind::ProgBits
    }
}

/// Debug section prefixes, checked in this order.
const DWARF_PREFIXES: [&str; 3] = [".debug_", ".zdebug_", "__debug_"];

/// Strips a DWARF prefix (`.debug_`, compressed `.zdebug_` or the macOS
/// `__debug_`) and returns what remains, e.g. `info` for `.debug_info`.
pub fn dwarf_suffix(name: &str) -> Option<&str> {
    DWARF_PREFIXES
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
}

/// The DWARF sections worth looking for before attempting a DWARF parse.
///
/// Location and range list sections (`loc`, `loclists`, `rnglists`) are
/// intentionally absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DwarfSection {
    Abbrev,
    Info,
    Str,
    Line,
    Ranges,
}

impl DwarfSection {
    pub const ALL: [DwarfSection; 5] = [
        DwarfSection::Abbrev,
        DwarfSection::Info,
        DwarfSection::Str,
        DwarfSection::Line,
        DwarfSection::Ranges,
    ];

    /// Classifies a raw section name.
    pub fn classify(name: &str) -> Option<Self> {
        dwarf_suffix(name).and_then(Self::from_suffix)
    }

    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "abbrev" => Some(DwarfSection::Abbrev),
            "info" => Some(DwarfSection::Info),
            "str" => Some(DwarfSection::Str),
            "line" => Some(DwarfSection::Line),
            "ranges" => Some(DwarfSection::Ranges),
            _ => None,
        }
    }

    pub fn section_id(self) -> gimli::SectionId {
        match self {
            DwarfSection::Abbrev => gimli::SectionId::DebugAbbrev,
            DwarfSection::Info => gimli::SectionId::DebugInfo,
            DwarfSection::Str => gimli::SectionId::DebugStr,
            DwarfSection::Line => gimli::SectionId::DebugLine,
            DwarfSection::Ranges => gimli::SectionId::DebugRanges,
        }
    }

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl std::str::FromStr for DwarfSection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_suffix(s)
            .or_else(|| Self::classify(s))
            .ok_or_else(|| format!("Unknown DWARF section: {}", s))
    }
}

impl fmt::Display for DwarfSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section_id().name())
    }
}

/// A finite set of [`DwarfSection`]s, one bit per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DwarfSectionSet(u8);

impl DwarfSectionSet {
    pub const fn empty() -> Self {
        DwarfSectionSet(0)
    }

    pub fn insert(&mut self, section: DwarfSection) {
        self.0 |= section.bit();
    }

    pub fn contains(self, section: DwarfSection) -> bool {
        self.0 & section.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = DwarfSection> {
        DwarfSection::ALL
            .into_iter()
            .filter(move |s| self.contains(*s))
    }
}

impl FromIterator<DwarfSection> for DwarfSectionSet {
    fn from_iter<I: IntoIterator<Item = DwarfSection>>(iter: I) -> Self {
        let mut set = DwarfSectionSet::empty();
        for section in iter {
            set.insert(section);
        }
        set
    }
}
