pub mod verilog;
pub mod vhdl;

use std::path::{Path, PathBuf};

use crate::language::Dialect;
use crate::paths::absolutize;

use verilog::VerilogGrammar;
use vhdl::VhdlGrammar;

/// The kind of design unit a definition pattern recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// VHDL `entity`.
    Entity,
    /// VHDL `package` or SystemVerilog `package`.
    Package,
    /// VHDL-2008 `context`.
    Context,
    /// Verilog/SystemVerilog `module` / `macromodule`.
    Module,
    /// SystemVerilog `interface` / `program`.
    Interface,
}

/// A unit defined in a file. `name` is already case-folded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDefinition {
    pub name: String,
    pub kind: UnitKind,
}

/// Library qualification carried by a unit reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryHint {
    /// No library written (`use pkg.all;`).
    Implicit,
    /// The reserved current-library word (`work`); treated like `Implicit`.
    Work,
    /// An explicit library name, already case-folded. A hard directive.
    Named(String),
    /// Dialects without libraries: look in the default library only.
    DefaultOnly,
}

/// A raw unit reference extracted from one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReference {
    pub hint: LibraryHint,
    /// Case-folded unit name.
    pub name: String,
    /// The reference as written (original case, `lib.unit` when qualified), for messages.
    pub text: String,
    /// Pattern matches that may not be references at all (Verilog instantiation
    /// syntax is shared with declarations). Unresolved speculative references are
    /// dropped without a warning.
    pub speculative: bool,
}

/// Everything the reference extractor found in one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Unit references in source order.
    pub units: Vec<UnitReference>,
    /// Existing `` `include`` targets, absolute and normalised, in source order.
    pub includes: Vec<PathBuf>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.units.is_empty() && self.includes.is_empty()
    }
}

/// Pattern set recognising unit declarations and references for one dialect family.
///
/// Implementations work on surface text only; no syntax is validated.
pub trait Grammar: Send + Sync {
    /// Remove comments so that commented-out code contributes nothing.
    fn strip_comments(&self, source: &str) -> String;

    /// Units declared in `source` (comments already stripped).
    fn definitions(&self, source: &str) -> Vec<UnitDefinition>;

    /// Unit references in `source` (comments already stripped).
    fn unit_references(&self, source: &str) -> Vec<UnitReference>;

    /// Raw textual-inclusion paths as written in `source`.
    fn include_directives(&self, _source: &str) -> Vec<String> {
        Vec::new()
    }
}

static VHDL: VhdlGrammar = VhdlGrammar;
static VERILOG: VerilogGrammar = VerilogGrammar;

/// The grammar used for files of `dialect`.
pub fn grammar_for(dialect: Dialect) -> &'static dyn Grammar {
    match dialect {
        Dialect::Vhdl => &VHDL,
        Dialect::Verilog | Dialect::SystemVerilog => &VERILOG,
    }
}

/// Read a source file, replacing invalid UTF-8 rather than failing on it.
pub fn read_source(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Scan `source` for the units it defines.
pub fn scan_definitions(dialect: Dialect, source: &str) -> Vec<UnitDefinition> {
    let grammar = grammar_for(dialect);
    grammar.definitions(&grammar.strip_comments(source))
}

/// Extract unit and inclusion references from the text of `path`.
///
/// Include paths are resolved against the directory of `path` and kept only
/// when the target exists on disk. `path` must be absolute.
pub fn extract_references(path: &Path, dialect: Dialect, source: &str) -> Extraction {
    let grammar = grammar_for(dialect);
    let stripped = grammar.strip_comments(source);
    let dir = path.parent().unwrap_or(Path::new("/"));

    let includes = grammar
        .include_directives(&stripped)
        .into_iter()
        .map(|raw| absolutize(Path::new(&raw), dir))
        .filter(|target| target.is_file())
        .collect();

    Extraction {
        units: grammar.unit_references(&stripped),
        includes,
    }
}

/// Read `path` and extract its references. Unreadable files yield an empty extraction.
pub fn extract_file(path: &Path, dialect: Dialect) -> Extraction {
    match read_source(path) {
        Ok(source) => extract_references(path, dialect, &source),
        Err(_) => Extraction::default(),
    }
}
