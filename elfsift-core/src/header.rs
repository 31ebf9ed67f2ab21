pub mod elf;

pub use elf::*;

/// The fields of a decoded ELF file header that the validator checks,
/// independent of word size.
pub trait Header: std::fmt::Debug + Send + Sync {
    /// Returns true if this is a 64-bit header.
    fn is_64(&self) -> bool;

    /// Returns the `e_version` field.
    fn version(&self) -> u32;

    /// Returns the file offset of the section header table.
    fn section_table_offset(&self) -> u64;

    /// Returns the number of section header entries.
    fn section_count(&self) -> u16;

    /// Returns the index of the section name string table.
    fn string_table_index(&self) -> u16;

    /// Returns the machine architecture identifier.
    fn machine(&self) -> u16;

    /// Returns the object file type (`ET_EXEC`, `ET_DYN`, ...).
    fn file_type(&self) -> u16;
}
