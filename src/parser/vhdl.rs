use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{Grammar, LibraryHint, UnitDefinition, UnitKind, UnitReference};

/// Reserved library name meaning "the library this file is compiled into".
pub const CURRENT_LIBRARY: &str = "work";

// `--` line comments and VHDL-2008 delimited comments.
static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)--[^\n]*|/\*.*?\*/").unwrap());

static ENTITY_DEF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*entity\s+(\w+)\s+is\b").unwrap());
// `package body x is` does not match: `body` is followed by a name, not `is`.
static PACKAGE_DEF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*package\s+(\w+)\s+is\b").unwrap());
static CONTEXT_DEF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*context\s+(\w+)\s+is\b").unwrap());

/// `use [lib.]pkg.all;`
static LIBRARY_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*library\s+(\w+(?:\s*,\s*\w+)*)\s*;").unwrap());
static USE_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*use\s+(?:(\w+)\.)?(\w+)\.all\s*;").unwrap());
/// `label : entity [lib.]name [(arch)]`
static ENTITY_INST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i):\s*entity\s+(?:(\w+)\.)?(\w+)").unwrap());
/// `context lib.name;` (a context reference, not a declaration).
static CONTEXT_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*context\s+(\w+)\.(\w+)\s*;").unwrap());

/// Library-aware grammar: units carry the file's library, references may be qualified.
pub struct VhdlGrammar;

impl Grammar for VhdlGrammar {
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
            (&*ENTITY_DEF, UnitKind::Entity),
            (&*PACKAGE_DEF, UnitKind::Package),
            (&*CONTEXT_DEF, UnitKind::Context),
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
        let libraries = declared_libraries(source);
        let mut refs = Vec::new();
        for regex in [&*USE_CLAUSE, &*ENTITY_INST, &*CONTEXT_REF] {
            for caps in regex.captures_iter(source) {
                let library = caps.get(1).map(|m| m.as_str());
                let unit = &caps[2];
                // `use work.all;` / `use mylib.all;` names a library, not a unit.
                if library.is_none() && libraries.contains(&unit.to_lowercase()) {
                    continue;
                }
                refs.push(qualified_reference(library, unit));
            }
        }
        refs
    }
}

/// `work` plus every name declared by a `library` clause, lowercased.
fn declared_libraries(source: &str) -> Vec<String> {
    let mut libraries = vec![CURRENT_LIBRARY.to_string()];
    for caps in LIBRARY_CLAUSE.captures_iter(source) {
        for name in caps[1].split(',') {
            let name = name.trim().to_lowercase();
            if !libraries.contains(&name) {
                libraries.push(name);
            }
        }
    }
    libraries
}

fn qualified_reference(library: Option<&str>, unit: &str) -> UnitReference {
    let hint = match library {
        None => LibraryHint::Implicit,
        Some(lib) if lib.eq_ignore_ascii_case(CURRENT_LIBRARY) => LibraryHint::Work,
        Some(lib) => LibraryHint::Named(lib.to_lowercase()),
    };
    let text = match library {
        Some(lib) => format!("{lib}.{unit}"),
        None => unit.to_string(),
    };
    UnitReference {
        hint,
        name: unit.to_lowercase(),
        text,
        speculative: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(source: &str) -> Vec<UnitReference> {
        let g = VhdlGrammar;
        g.unit_references(&g.strip_comments(source))
    }

    #[test]
    fn test_definitions_entity_package_context() {
        let source = r#"
ENTITY Adder IS
  port (a : in bit);
end entity;
package my_pkg is
end package;
package body my_pkg is
end package body;
context ctx is
  library ieee;
end context;
"#;
        let defs = VhdlGrammar.definitions(source);
        let names: Vec<(&str, UnitKind)> =
            defs.iter().map(|d| (d.name.as_str(), d.kind)).collect();
        assert_eq!(
            names,
            vec![
                ("adder", UnitKind::Entity),
                ("my_pkg", UnitKind::Package),
                ("ctx", UnitKind::Context),
            ]
        );
    }

    #[test]
    fn test_use_clause_hints() {
        let r = refs(
            "library ieee;\nuse ieee.std_logic_1164.all;\nuse WORK.Types.all;\nuse helpers.all;\n",
        );
        assert_eq!(r.len(), 3);
        assert_eq!(r[0].hint, LibraryHint::Named("ieee".into()));
        assert_eq!(r[0].name, "std_logic_1164");
        assert_eq!(r[1].hint, LibraryHint::Work);
        assert_eq!(r[1].name, "types");
        assert_eq!(r[1].text, "WORK.Types");
        assert_eq!(r[2].hint, LibraryHint::Implicit);
        assert_eq!(r[2].name, "helpers");
    }

    #[test]
    fn test_entity_instantiation() {
        let r = refs(
            "u0 : entity work.fifo(rtl)\n  port map (clk => clk);\nu1: entity mylib.Uart port map (x);\nu2 : entity core;\n",
        );
        let got: Vec<(LibraryHint, &str)> =
            r.iter().map(|x| (x.hint.clone(), x.name.as_str())).collect();
        assert_eq!(
            got,
            vec![
                (LibraryHint::Work, "fifo"),
                (LibraryHint::Named("mylib".into()), "uart"),
                (LibraryHint::Implicit, "core"),
            ]
        );
        assert!(r.iter().all(|x| !x.speculative));
    }

    #[test]
    fn test_context_reference() {
        let r = refs("context vendor.base_ctx;\n");
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].hint, LibraryHint::Named("vendor".into()));
        assert_eq!(r[0].name, "base_ctx");
    }

    #[test]
    fn test_commented_references_ignored() {
        let r = refs("-- u0 : entity work.ghost\n/* use work.old.all; */\nu1 : entity work.live;\n");
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].name, "live");
    }

    #[test]
    fn test_block_opener_inside_line_comment_is_inert() {
        let source = "-- legacy: /* old instance\nu0 : entity work.fifo;\n-- end of legacy */\n";
        let r = refs(source);
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].hint, LibraryHint::Work);
        assert_eq!(r[0].name, "fifo");
    }

    #[test]
    fn test_use_of_whole_library_is_not_a_unit_reference() {
        let source = "library ieee, MyLib;\nuse work.all;\nuse mylib.all;\nuse util_pkg.all;\n";
        let r = refs(source);
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].hint, LibraryHint::Implicit);
        assert_eq!(r[0].name, "util_pkg");
    }
}
