//! Builds small ELF64 little-endian images for the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

pub use goblin::elf::section_header::{
    SHT_DYNSYM, SHT_NOBITS, SHT_NOTE, SHT_PROGBITS, SHT_RELA, SHT_STRTAB, SHT_SYMTAB,
};

const EHDR_SIZE: usize = 64;
const SHDR_SIZE: usize = 64;
const SYM_SIZE: usize = 24;

struct SectionSpec {
    name: String,
    sh_type: u32,
    data: Vec<u8>,
    link: u32,
    entsize: u64,
}

/// Lays out: header, section contents, section header table.
/// Section 0 is the null section and `.shstrtab` always comes last.
#[derive(Default)]
pub struct ElfBuilder {
    sections: Vec<SectionSpec>,
    symbols: Vec<String>,
    corrupted: Vec<String>,
    no_section_table: bool,
}

impl ElfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// An image whose header declares no section table at all.
    pub fn without_sections() -> Self {
        Self {
            no_section_table: true,
            ..Self::default()
        }
    }

    pub fn section(mut self, name: &str, sh_type: u32) -> Self {
        self.sections.push(SectionSpec {
            name: name.to_string(),
            sh_type,
            data: vec![0xcc; 16],
            link: 0,
            entsize: 0,
        });
        self
    }

    /// Adds a `.symtab` (and its `.strtab`) holding these names.
    pub fn symbol(mut self, name: &str) -> Self {
        self.symbols.push(name.to_string());
        self
    }

    /// Points the named section's `sh_offset` far past the end of the file.
    pub fn corrupt(mut self, name: &str) -> Self {
        self.corrupted.push(name.to_string());
        self
    }

    pub fn dynsym(mut self) -> Self {
        self.sections.push(SectionSpec {
            name: ".dynsym".to_string(),
            sh_type: SHT_DYNSYM,
            data: vec![0; SYM_SIZE],
            link: 0,
            entsize: SYM_SIZE as u64,
        });
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        if self.no_section_table {
            return header(0, 0, 0);
        }

        if !self.symbols.is_empty() {
            self.push_symtab();
        }

        let mut shstrtab = vec![0u8];
        let mut name_offsets = Vec::new();
        for sec in self.sections.iter().map(|s| s.name.as_str()).chain([".shstrtab"]) {
            name_offsets.push(shstrtab.len() as u32);
            shstrtab.extend_from_slice(sec.as_bytes());
            shstrtab.push(0);
        }
        self.sections.push(SectionSpec {
            name: ".shstrtab".to_string(),
            sh_type: SHT_STRTAB,
            data: shstrtab,
            link: 0,
            entsize: 0,
        });

        let mut body = Vec::new();
        let mut offsets = Vec::new();
        for sec in &self.sections {
            align(&mut body, EHDR_SIZE, 8);
            offsets.push((EHDR_SIZE + body.len()) as u64);
            body.extend_from_slice(&sec.data);
        }
        align(&mut body, EHDR_SIZE, 8);
        let shoff = (EHDR_SIZE + body.len()) as u64;

        let shnum = (self.sections.len() + 1) as u16;
        let mut out = header(shoff, shnum, shnum - 1);
        out.extend_from_slice(&body);

        out.extend_from_slice(&[0u8; SHDR_SIZE]);
        for (i, sec) in self.sections.iter().enumerate() {
            out.extend_from_slice(&name_offsets[i].to_le_bytes()); // sh_name
            out.extend_from_slice(&sec.sh_type.to_le_bytes());
            out.extend_from_slice(&0u64.to_le_bytes()); // sh_flags
            out.extend_from_slice(&0u64.to_le_bytes()); // sh_addr
            let offset = if self.corrupted.contains(&sec.name) {
                0x7fff_ffff
            } else {
                offsets[i]
            };
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(&(sec.data.len() as u64).to_le_bytes());
            out.extend_from_slice(&sec.link.to_le_bytes());
            let info: u32 = if sec.sh_type == SHT_SYMTAB { 1 } else { 0 };
            out.extend_from_slice(&info.to_le_bytes());
            out.extend_from_slice(&8u64.to_le_bytes()); // sh_addralign
            out.extend_from_slice(&sec.entsize.to_le_bytes());
        }
        out
    }

    pub fn write(self, name: &str) -> TempElf {
        TempElf::new(name, &self.build())
    }

    fn push_symtab(&mut self) {
        let mut strtab = vec![0u8];
        let mut symtab = vec![0u8; SYM_SIZE];
        for (i, name) in self.symbols.iter().enumerate() {
            symtab.extend_from_slice(&(strtab.len() as u32).to_le_bytes());
            symtab.push(0x12); // STB_GLOBAL | STT_FUNC
            symtab.push(0);
            symtab.extend_from_slice(&1u16.to_le_bytes());
            symtab.extend_from_slice(&(0x401000 + 0x10 * i as u64).to_le_bytes());
            symtab.extend_from_slice(&0x10u64.to_le_bytes());
            strtab.extend_from_slice(name.as_bytes());
            strtab.push(0);
        }

        // +1 for the null section in front.
        let strtab_index = (self.sections.len() + 2) as u32;
        self.sections.push(SectionSpec {
            name: ".symtab".to_string(),
            sh_type: SHT_SYMTAB,
            data: symtab,
            link: strtab_index,
            entsize: SYM_SIZE as u64,
        });
        self.sections.push(SectionSpec {
            name: ".strtab".to_string(),
            sh_type: SHT_STRTAB,
            data: strtab,
            link: 0,
            entsize: 0,
        });
    }
}

fn align(body: &mut Vec<u8>, base: usize, to: usize) {
    while (base + body.len()) % to != 0 {
        body.push(0);
    }
}

fn header(shoff: u64, shnum: u16, shstrndx: u16) -> Vec<u8> {
    let mut h = b"\x7fELF\x02\x01\x01".to_vec();
    h.resize(16, 0);
    h.extend_from_slice(&2u16.to_le_bytes()); // ET_EXEC
    h.extend_from_slice(&62u16.to_le_bytes()); // EM_X86_64
    h.extend_from_slice(&1u32.to_le_bytes());
    h.extend_from_slice(&0x401000u64.to_le_bytes());
    h.extend_from_slice(&0u64.to_le_bytes()); // e_phoff
    h.extend_from_slice(&shoff.to_le_bytes());
    h.extend_from_slice(&0u32.to_le_bytes());
    h.extend_from_slice(&(EHDR_SIZE as u16).to_le_bytes());
    h.extend_from_slice(&56u16.to_le_bytes());
    h.extend_from_slice(&0u16.to_le_bytes()); // e_phnum
    h.extend_from_slice(&(SHDR_SIZE as u16).to_le_bytes());
    h.extend_from_slice(&shnum.to_le_bytes());
    h.extend_from_slice(&shstrndx.to_le_bytes());
    h
}

/// A file in the temp dir, removed on drop.
pub struct TempElf {
    path: PathBuf,
}

impl TempElf {
    pub fn new(name: &str, bytes: &[u8]) -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let path = std::env::temp_dir().join(format!(
            "elfsift-{}-{}-{}",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed),
            name
        ));
        std::fs::write(&path, bytes).expect("write temp elf");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempElf {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
