mod report;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use elfsift_core::{Error, ObjectData};
use report::{Check, Report};
use serde::Serialize;
use tabled::Tabled;

/// Checks whether an ELF binary is fit to be symbolized
#[derive(Parser)]
#[command(
    name = "elfsift",
    about = "Classify ELF binaries before symbolization (DWARF, Go, symbol tables, header sanity)",
    version,
    author
)]
struct Cli {
    /// Path to binary file
    #[arg(required = true)]
    path: std::path::PathBuf,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Does the binary carry DWARF debug information
    Dwarf,
    /// Was the binary built by the Go toolchain (build id note)
    Go,
    /// Can the Go binary be symbolized from .gopclntab
    Symbolizable,
    /// Does the binary carry .symtab or .dynsym
    Symbols,
    /// Reject binaries that parse but have no sections
    Validate,
    /// Sanity-check the ELF header bytes without a full parse
    Header,
    /// List all sections
    Sections,
    /// Run every check
    Report,
}

#[derive(Serialize)]
struct Verdict<'a> {
    path: &'a std::path::Path,
    check: &'static str,
    result: Check,
}

#[derive(Serialize, Tabled)]
struct SectionRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Section")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Size")]
    size: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let path = cli.path.as_path();

    let (check, outcome): (&'static str, elfsift_core::Result<bool>) = match cli.command {
        Command::Dwarf => ("dwarf", elfsift_core::has_dwarf(path)),
        Command::Go => ("go", elfsift_core::is_go_obj_file(path)),
        Command::Symbolizable => ("symbolizable", elfsift_core::is_symbolizable_go_obj_file(path)),
        Command::Symbols => ("symbols", elfsift_core::has_symbols(path)),
        Command::Validate => ("validate", elfsift_core::validate_file(path).map(|()| true)),

        Command::Header => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            let checked = elfsift_core::read_header(file)
                .with_context(|| format!("{}: invalid ELF header", path.display()))?;
            let (ident, header) = (checked.ident, checked.header);
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "path": path,
                        "class": ident.class.to_string(),
                        "encoding": ident.encoding.to_string(),
                        "type": header.file_type(),
                        "machine": header.machine(),
                        "version": header.version(),
                        "shoff": header.section_table_offset(),
                        "shnum": header.section_count(),
                        "shstrndx": header.string_table_index(),
                    })
                );
            } else {
                println!("Class:        {}", ident.class);
                println!("Data:         {}", ident.encoding);
                println!("Type:         {}", header.file_type());
                println!("Machine:      {}", header.machine());
                println!("Version:      {}", header.version());
                println!("Section off:  0x{:x}", header.section_table_offset());
                println!("Sections:     {}", header.section_count());
                println!("Shstrndx:     {}", header.string_table_index());
            }
            return Ok(());
        }

        Command::Sections => {
            let data = ObjectData::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            let obj = data.parse()?;
            let rows: Vec<SectionRow> = obj
                .sections()
                .iter()
                .map(|s| SectionRow {
                    index: s.index,
                    name: s.name.to_string(),
                    kind: s.kind.to_string(),
                    size: s.size,
                })
                .collect();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if rows.is_empty() {
                println!("No sections found (possibly stripped binary).");
            } else {
                println!("{}", tabled::Table::new(rows));
            }
            return Ok(());
        }

        Command::Report => {
            let report = Report::build(path);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.path.bold());
                println!("{}", report.table());
            }
            return Ok(());
        }
    };

    let failed = outcome.as_ref().err().map(Error::kind);
    let result = Check::from_result(outcome);
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&Verdict {
                path,
                check,
                result,
            })?
        );
    } else {
        println!("{check}: {}", result.colored());
    }

    if let Some(kind) = failed {
        log::debug!("{} failed with {kind:?}", check);
        std::process::exit(1);
    }
    Ok(())
}
