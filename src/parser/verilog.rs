use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{Grammar, LibraryHint, UnitDefinition, UnitKind, UnitReference};

/// Words that sit where an instantiated module name would, but start a
/// declaration instead (`wire [3:0] bus (...)`, `parameter P (...)`).
const NOT_MODULES: &[&str] = &[
    "input",
    "output",
    "inout",
    "reg",
    "wire",
    "logic",
    "integer",
    "genvar",
    "parameter",
    "localparam",
    "bit",
    "byte",
    "int",
    "real",
    "time",
    "string",
    "module",
    "macromodule",
    "interface",
    "program",
    "function",
    "task",
    "typedef",
];

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)//[^\n]*|/\*.*?\*/").unwrap());

static INCLUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^\s*`include\s*"([^"]*)""#).unwrap());

static MODULE_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^\s*(?:module|macromodule)\s+([a-zA-Z_]\w*)\s*(?:#\s*\(.*?\))?\s*[;(]")
        .unwrap()
});
static INTERFACE_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^\s*(?:interface|program)\s+([a-zA-Z_]\w*)\s*(?:#\s*\(.*?\))?\s*[;(]")
        .unwrap()
});
static PACKAGE_DEF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*package\s+([a-zA-Z_]\w*)\s*;").unwrap());

/// `type [#(...)] instance (`
static INSTANTIATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*([a-zA-Z_]\w*)\s*(?:#\s*\(.*?\))?\s+([a-zA-Z_]\w*)\s*\(").unwrap()
});
/// `pkg::item` scope resolution, covering `import pkg::*;`.
static PACKAGE_SCOPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([a-zA-Z_]\w*)\s*::").unwrap());

/// Library-unaware grammar for Verilog and SystemVerilog.
pub struct VerilogGrammar;

impl Grammar for VerilogGrammar {
    fn strip_comments(&self, source: &str) -> String {
        // One leftmost pass, so a `/*` inside a line comment opens nothing.
        COMMENT
            .replace_all(source, |caps: &Captures| {
                if caps[0].starts_with("/*") { " " } else { "" }
            })
            .into_owned()
    }

    fn definitions(&self, source: &str) -> Vec<UnitDefinition> {
        let mut defs = Vec::new();
        for (regex, kind) in [
            (&*MODULE_DEF, UnitKind::Module),
            (&*INTERFACE_DEF, UnitKind::Interface),
            (&*PACKAGE_DEF, UnitKind::Package),
        ] {
            for caps in regex.captures_iter(source) {
                defs.push(UnitDefinition {
                    name: caps[1].to_lowercase(),
                    kind,
                });
            }
        }
        defs
    }

    fn unit_references(&self, source: &str) -> Vec<UnitReference> {
        let mut refs = Vec::new();

        for caps in INSTANTIATION.captures_iter(source) {
            let name = &caps[1];
            let folded = name.to_lowercase();
            if NOT_MODULES.contains(&folded.as_str()) {
                continue;
            }
            refs.push(speculative(name, folded));
        }

        for caps in PACKAGE_SCOPE.captures_iter(source) {
            let name = &caps[1];
            refs.push(speculative(name, name.to_lowercase()));
        }

        refs
    }

    fn include_directives(&self, source: &str) -> Vec<String> {
        INCLUDE
            .captures_iter(source)
            .map(|caps| caps[1].to_string())
            .collect()
    }
}

fn speculative(text: &str, name: String) -> UnitReference {
    UnitReference {
        hint: LibraryHint::DefaultOnly,
        name,
        text: text.to_string(),
        speculative: true,
    }
}
