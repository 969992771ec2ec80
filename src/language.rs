use std::collections::HashMap;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// A hardware-description dialect handled by hdl-order.
///
/// Plain enum, cheap to copy and pattern-matched at dispatch boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    Vhdl,
    Verilog,
    SystemVerilog,
}

/// How a dialect relates to logical libraries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectFamily {
    /// Units live in named libraries and references may be library-qualified (VHDL).
    LibraryAware,
    /// No library concept; units always land in the default library (Verilog/SV).
    LibraryUnaware,
}

impl Dialect {
    pub const ALL: [Dialect; 3] = [Dialect::Vhdl, Dialect::Verilog, Dialect::SystemVerilog];

    pub fn family(&self) -> DialectFamily {
        match self {
            Dialect::Vhdl => DialectFamily::LibraryAware,
            Dialect::Verilog | Dialect::SystemVerilog => DialectFamily::LibraryUnaware,
        }
    }

    /// Extensions recognised when no `[extensions]` override is configured.
    pub fn default_extensions(&self) -> &'static [&'static str] {
        match self {
            Dialect::Vhdl => &["vhd", "vhdl"],
            Dialect::Verilog => &["v"],
            Dialect::SystemVerilog => &["sv"],
        }
    }

    /// File-type string understood by TerosHDL project files.
    pub fn file_type(&self, vhdl_std: VhdlStandard) -> String {
        match self {
            Dialect::Vhdl => format!("vhdlSource-{}", vhdl_std.as_str()),
            Dialect::Verilog => "verilogSource-2001".to_string(),
            Dialect::SystemVerilog => "systemVerilogSource-2017".to_string(),
        }
    }

    /// Parse a configuration key into a `Dialect`. Case-insensitive.
    pub fn from_str_loose(s: &str) -> Option<Dialect> {
        match s.to_lowercase().as_str() {
            "vhdl" | "vhd" => Some(Dialect::Vhdl),
            "verilog" | "v" => Some(Dialect::Verilog),
            "systemverilog" | "sv" => Some(Dialect::SystemVerilog),
            _ => None,
        }
    }
}

/// VHDL language revision reported in the `file_type` of VHDL entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum VhdlStandard {
    #[value(name = "93")]
    #[serde(rename = "93")]
    V93,
    #[value(name = "2002")]
    #[serde(rename = "2002")]
    V2002,
    #[default]
    #[value(name = "2008")]
    #[serde(rename = "2008")]
    V2008,
    #[value(name = "2019")]
    #[serde(rename = "2019")]
    V2019,
}

impl VhdlStandard {
    pub fn as_str(&self) -> &'static str {
        match self {
            VhdlStandard::V93 => "93",
            VhdlStandard::V2002 => "2002",
            VhdlStandard::V2008 => "2008",
            VhdlStandard::V2019 => "2019",
        }
    }
}

/// Mapping from lowercase file extension to dialect.
#[derive(Debug, Clone)]
pub struct DialectMap {
    by_extension: HashMap<String, Dialect>,
}

impl DialectMap {
    /// Build a map from per-dialect overrides. Dialects absent from `overrides`
    /// keep their default extensions; unknown dialect keys are ignored with a warning.
    pub fn with_overrides(overrides: &HashMap<String, Vec<String>>) -> Self {
        let mut per_dialect: Vec<(Dialect, Vec<String>)> = Dialect::ALL
            .iter()
            .map(|d| {
                let exts = d.default_extensions().iter().map(|e| e.to_string()).collect();
                (*d, exts)
            })
            .collect();

        // Sorted so that a conflicting extension resolves the same way on every run.
        let mut keys: Vec<&String> = overrides.keys().collect();
        keys.sort();
        for key in keys {
            match Dialect::from_str_loose(key) {
                Some(dialect) => {
                    if let Some(entry) = per_dialect.iter_mut().find(|(d, _)| *d == dialect) {
                        entry.1 = overrides[key].clone();
                    }
                }
                None => eprintln!("warning: unknown dialect '{key}' in [extensions]; ignored"),
            }
        }

        let mut by_extension = HashMap::new();
        for (dialect, exts) in per_dialect {
            for ext in exts {
                let ext = ext.trim_start_matches('.').to_lowercase();
                by_extension.entry(ext).or_insert(dialect);
            }
        }
        Self { by_extension }
    }

    /// Dialect of `path` by extension (case-insensitive), if recognised.
    pub fn dialect_for(&self, path: &Path) -> Option<Dialect> {
        let ext = path.extension().and_then(|e| e.to_str())?;
        self.by_extension.get(&ext.to_lowercase()).copied()
    }
}

impl Default for DialectMap {
    fn default() -> Self {
        Self::with_overrides(&HashMap::new())
    }
}
