use std::path::Path;

use colored::Colorize;
use elfsift_core::{
    dwarf_sections, has_symbols_in, is_go_obj_file_in, is_symbolizable_go_obj_file_in,
    validate_header_bytes, ObjectData,
};
use serde::Serialize;
use tabled::Tabled;

/// Outcome of a single check: a verdict or the error that stopped it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    Yes,
    No,
    Error(String),
}

impl Check {
    pub fn from_result<E: std::fmt::Display>(r: Result<bool, E>) -> Self {
        match r {
            Ok(true) => Check::Yes,
            Ok(false) => Check::No,
            Err(e) => Check::Error(e.to_string()),
        }
    }

    pub fn from_bool(b: bool) -> Self {
        if b {
            Check::Yes
        } else {
            Check::No
        }
    }

    pub fn colored(&self) -> String {
        match self {
            Check::Yes => "yes".green().to_string(),
            Check::No => "no".yellow().to_string(),
            Check::Error(e) => e.red().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub path: String,
    pub header: Check,
    pub sections: Check,
    pub dwarf: Check,
    pub dwarf_sections: Vec<String>,
    pub symbols: Check,
    pub go: Check,
    pub go_symbolizable: Check,
}

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "Check")]
    name: &'static str,
    #[tabled(rename = "Result")]
    result: String,
}

impl Report {
    /// Runs every check, parsing the file once.
    pub fn build(path: &Path) -> Self {
        let header = Check::from_result(
            std::fs::File::open(path)
                .map_err(|e| elfsift_core::Error::Open(e.into()))
                .and_then(validate_header_bytes)
                .map(|()| true),
        );

        let mut report = Report {
            path: path.display().to_string(),
            header,
            sections: Check::No,
            dwarf: Check::No,
            dwarf_sections: Vec::new(),
            symbols: Check::No,
            go: Check::No,
            go_symbolizable: Check::No,
        };

        let parsed = ObjectData::open(path).and_then(|data| {
            let obj = data.parse()?;
            report.sections = Check::from_result(obj.validate().map(|()| true));
            let dwarf = dwarf_sections(&obj);
            report.dwarf = Check::from_bool(!dwarf.is_empty());
            report.dwarf_sections = dwarf.iter().map(|s| s.to_string()).collect();
            report.symbols = Check::from_bool(has_symbols_in(&obj));
            report.go = Check::from_bool(is_go_obj_file_in(&obj));
            report.go_symbolizable = Check::from_result(is_symbolizable_go_obj_file_in(&obj));
            Ok(())
        });

        if let Err(e) = parsed {
            log::debug!("{}: {e}", report.path);
            let msg = e.to_string();
            for check in [
                &mut report.sections,
                &mut report.dwarf,
                &mut report.symbols,
                &mut report.go,
                &mut report.go_symbolizable,
            ] {
                *check = Check::Error(msg.clone());
            }
        }
        report
    }

    pub fn table(&self) -> tabled::Table {
        let dwarf_sections = if self.dwarf_sections.is_empty() {
            "-".to_string()
        } else {
            self.dwarf_sections.join(", ")
        };
        tabled::Table::new([
            Row {
                name: "header",
                result: self.header.colored(),
            },
            Row {
                name: "has sections",
                result: self.sections.colored(),
            },
            Row {
                name: "dwarf",
                result: self.dwarf.colored(),
            },
            Row {
                name: "dwarf sections",
                result: dwarf_sections,
            },
            Row {
                name: "symbol table",
                result: self.symbols.colored(),
            },
            Row {
                name: "go build id",
                result: self.go.colored(),
            },
            Row {
                name: "go symbolizable",
                result: self.go_symbolizable.colored(),
            },
        ])
    }
}
