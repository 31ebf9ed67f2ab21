use crate::error::FormatError;
use crate::header::Header;
use byteorder::{ByteOrder, ReadBytesExt, BE, LE};
use std::fmt;
use std::io;

pub const ELFMAG: [u8; 4] = *b"\x7fELF";
pub const EI_NIDENT: usize = 16;
pub const EI_CLASS: usize = 4;
pub const EI_DATA: usize = 5;
pub const EI_VERSION: usize = 6;
pub const EV_CURRENT: u8 = 1;

/// Size of `Elf32_Ehdr`.
pub const ELF32_EHDR_SIZE: usize = 52;
/// Size of `Elf64_Ehdr`, and the most the validator ever reads.
pub const ELF64_EHDR_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Elf32,
    Elf64,
}

impl Class {
    pub fn from_byte(b: u8) -> Result<Self, FormatError> {
        match b {
            1 => Ok(Class::Elf32),
            2 => Ok(Class::Elf64),
            other => Err(FormatError::UnknownClass(other)),
        }
    }

    pub fn header_size(self) -> usize {
        match self {
            Class::Elf32 => ELF32_EHDR_SIZE,
            Class::Elf64 => ELF64_EHDR_SIZE,
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Class::Elf32 => f.write_str("ELFCLASS32"),
            Class::Elf64 => f.write_str("ELFCLASS64"),
        }
    }
}

/// Byte order of every multi-byte field after `e_ident`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Little,
    Big,
}

impl Encoding {
    pub fn from_byte(b: u8) -> Result<Self, FormatError> {
        match b {
            1 => Ok(Encoding::Little),
            2 => Ok(Encoding::Big),
            other => Err(FormatError::UnknownEncoding(other)),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Little => f.write_str("ELFDATA2LSB"),
            Encoding::Big => f.write_str("ELFDATA2MSB"),
        }
    }
}

/// The validated `e_ident` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident {
    pub class: Class,
    pub encoding: Encoding,
    pub version: u8,
}

impl Ident {
    /// Checks magic, class, data encoding and version, in that order.
    pub fn parse(e_ident: &[u8; EI_NIDENT]) -> Result<Self, FormatError> {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&e_ident[..4]);
        if magic != ELFMAG {
            return Err(FormatError::BadMagic(magic));
        }

        let class = Class::from_byte(e_ident[EI_CLASS])?;
        let encoding = Encoding::from_byte(e_ident[EI_DATA])?;

        let version = e_ident[EI_VERSION];
        if version != EV_CURRENT {
            return Err(FormatError::UnknownVersion(version));
        }

        Ok(Ident {
            class,
            encoding,
            version,
        })
    }

    /// Decodes the full file header from `buf`, which starts at offset 0
    /// of the file. The 32-bit layout never looks past its own 52 bytes.
    pub fn decode_header(&self, buf: &[u8]) -> io::Result<Box<dyn Header>> {
        let len = buf.len().min(self.class.header_size());
        let mut cur = io::Cursor::new(&buf[..len]);
        Ok(match (self.class, self.encoding) {
            (Class::Elf32, Encoding::Little) => Box::new(Elf32Ehdr::from_reader::<LE, _>(&mut cur)?),
            (Class::Elf32, Encoding::Big) => Box::new(Elf32Ehdr::from_reader::<BE, _>(&mut cur)?),
            (Class::Elf64, Encoding::Little) => Box::new(Elf64Ehdr::from_reader::<LE, _>(&mut cur)?),
            (Class::Elf64, Encoding::Big) => Box::new(Elf64Ehdr::from_reader::<BE, _>(&mut cur)?),
        })
    }
}

/// `Elf32_Ehdr`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Elf32Ehdr {
    pub e_ident: [u8; 16],
    pub e_type: u16,
    pub e_machine: u16,
    pub e_version: u32,
    pub e_entry: u32,
    pub e_phoff: u32,
    pub e_shoff: u32,
    pub e_flags: u32,
    pub e_ehsize: u16,
    pub e_phentsize: u16,
    pub e_phnum: u16,
    pub e_shentsize: u16,
    pub e_shnum: u16,
    pub e_shstrndx: u16,
}

impl Elf32Ehdr {
    pub fn from_reader<B: ByteOrder, R: io::Read>(cur: &mut R) -> io::Result<Elf32Ehdr> {
        let mut e_ident = [0u8; 16];
        cur.read_exact(&mut e_ident)?;

        Ok(Elf32Ehdr {
            e_ident,
            e_type: cur.read_u16::<B>()?,
            e_machine: cur.read_u16::<B>()?,
            e_version: cur.read_u32::<B>()?,
            e_entry: cur.read_u32::<B>()?,
            e_phoff: cur.read_u32::<B>()?,
            e_shoff: cur.read_u32::<B>()?,
            e_flags: cur.read_u32::<B>()?,
            e_ehsize: cur.read_u16::<B>()?,
            e_phentsize: cur.read_u16::<B>()?,
            e_phnum: cur.read_u16::<B>()?,
            e_shentsize: cur.read_u16::<B>()?,
            e_shnum: cur.read_u16::<B>()?,
            e_shstrndx: cur.read_u16::<B>()?,
        })
    }
}

impl Header for Elf32Ehdr {
    fn is_64(&self) -> bool {
        false
    }

    fn version(&self) -> u32 {
        self.e_version
    }

    fn section_table_offset(&self) -> u64 {
        self.e_shoff as u64
    }

    fn section_count(&self) -> u16 {
        self.e_shnum
    }

    fn string_table_index(&self) -> u16 {
        self.e_shstrndx
    }

    fn machine(&self) -> u16 {
        self.e_machine
    }

    fn file_type(&self) -> u16 {
        self.e_type
    }
}

/// Represents the ELF header for a 64-bit object file (`Elf64_Ehdr`).
///
/// It appears at the very beginning of every ELF file and describes where
/// the program and section header tables live.
///
/// Reference: [ELF Specification v1.2](https://refspecs.linuxfoundation.org/elf/elf.pdf)
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Elf64Ehdr {
    /// ELF identification bytes (magic number, class, encoding, version).
    pub e_ident: [u8; 16],

    /// Object file type (e.g. relocatable, executable, shared, core).
    pub e_type: u16,

    /// Target architecture (e.g., `EM_X86_64` = 62).
    pub e_machine: u16,

    /// ELF version, must match `e_ident[EI_VERSION]`.
    pub e_version: u32,

    pub e_entry: u64,
    pub e_phoff: u64,

    /// File offset of the section header table.
    pub e_shoff: u64,

    pub e_flags: u32,
    pub e_ehsize: u16,
    pub e_phentsize: u16,
    pub e_phnum: u16,
    pub e_shentsize: u16,

    /// Number of entries in the section header table.
    pub e_shnum: u16,

    /// Index of the section header string table.
    pub e_shstrndx: u16,
}

impl Elf64Ehdr {
    pub fn from_reader<B: ByteOrder, R: io::Read>(cur: &mut R) -> io::Result<Elf64Ehdr> {
        let mut e_ident = [0u8; 16];
        cur.read_exact(&mut e_ident)?;

        Ok(Elf64Ehdr {
            e_ident,
            e_type: cur.read_u16::<B>()?,
            e_machine: cur.read_u16::<B>()?,
            e_version: cur.read_u32::<B>()?,
            e_entry: cur.read_u64::<B>()?,
            e_phoff: cur.read_u64::<B>()?,
            e_shoff: cur.read_u64::<B>()?,
            e_flags: cur.read_u32::<B>()?,
            e_ehsize: cur.read_u16::<B>()?,
            e_phentsize: cur.read_u16::<B>()?,
            e_phnum: cur.read_u16::<B>()?,
            e_shentsize: cur.read_u16::<B>()?,
            e_shnum: cur.read_u16::<B>()?,
            e_shstrndx: cur.read_u16::<B>()?,
        })
    }
}

impl Header for Elf64Ehdr {
    fn is_64(&self) -> bool {
        true
    }

    fn version(&self) -> u32 {
        self.e_version
    }

    fn section_table_offset(&self) -> u64 {
        self.e_shoff
    }

    fn section_count(&self) -> u16 {
        self.e_shnum
    }

    fn string_table_index(&self) -> u16 {
        self.e_shstrndx
    }

    fn machine(&self) -> u16 {
        self.e_machine
    }

    fn file_type(&self) -> u16 {
        self.e_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(class: u8, data: u8, version: u8) -> [u8; 16] {
        let mut id = [0u8; 16];
        id[..4].copy_from_slice(&ELFMAG);
        id[EI_CLASS] = class;
        id[EI_DATA] = data;
        id[EI_VERSION] = version;
        id
    }

    #[test]
    fn ident_checks_in_order() {
        assert_eq!(
            Ident::parse(&ident(2, 1, 1)),
            Ok(Ident {
                class: Class::Elf64,
                encoding: Encoding::Little,
                version: 1
            })
        );
        assert_eq!(
            Ident::parse(&ident(3, 9, 9)),
            Err(FormatError::UnknownClass(3))
        );
        assert_eq!(
            Ident::parse(&ident(1, 0, 9)),
            Err(FormatError::UnknownEncoding(0))
        );
        assert_eq!(
            Ident::parse(&ident(1, 2, 0)),
            Err(FormatError::UnknownVersion(0))
        );

        let mut bad = ident(2, 1, 1);
        bad[0] = b'M';
        assert_eq!(
            Ident::parse(&bad),
            Err(FormatError::BadMagic(*b"MELF"))
        );
    }

    #[test]
    fn class_and_encoding_names() {
        assert_eq!(Class::Elf64.to_string(), "ELFCLASS64");
        assert_eq!(Class::Elf32.to_string(), "ELFCLASS32");
        assert_eq!(Encoding::Big.to_string(), "ELFDATA2MSB");
        assert_eq!(Encoding::Little.to_string(), "ELFDATA2LSB");
    }

    #[test]
    fn decodes_big_endian_32() {
        let mut buf = ident(1, 2, 1).to_vec();
        buf.extend_from_slice(&2u16.to_be_bytes()); // e_type
        buf.extend_from_slice(&20u16.to_be_bytes()); // e_machine
        buf.extend_from_slice(&1u32.to_be_bytes()); // e_version
        buf.extend_from_slice(&0x1000u32.to_be_bytes()); // e_entry
        buf.extend_from_slice(&52u32.to_be_bytes()); // e_phoff
        buf.extend_from_slice(&0x2000u32.to_be_bytes()); // e_shoff
        buf.extend_from_slice(&0u32.to_be_bytes()); // e_flags
        for v in [52u16, 32, 1, 40, 5, 4] {
            buf.extend_from_slice(&v.to_be_bytes());
        }
        assert_eq!(buf.len(), ELF32_EHDR_SIZE);
        // Trailing bytes past the 32-bit header are ignored.
        buf.extend_from_slice(&[0xff; 12]);

        let id = Ident::parse(buf[..16].try_into().unwrap()).unwrap();
        let hdr = id.decode_header(&buf).unwrap();
        assert!(!hdr.is_64());
        assert_eq!(hdr.version(), 1);
        assert_eq!(hdr.machine(), 20);
        assert_eq!(hdr.section_table_offset(), 0x2000);
        assert_eq!(hdr.section_count(), 5);
        assert_eq!(hdr.string_table_index(), 4);
    }

    #[test]
    fn truncated_header_is_an_io_error() {
        let buf = ident(2, 1, 1);
        let id = Ident::parse(&buf).unwrap();
        let err = id.decode_header(&buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
