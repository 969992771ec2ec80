use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::paths::comparable;

/// A single `library -> path prefix` rule, prefix kept in comparable form.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LibraryRule {
    library: String,
    prefix: String,
}

/// Path-prefix rules assigning files to logical libraries.
///
/// Rules are kept sorted by prefix length, longest first, so that a rule for
/// `src/common/special` outranks one for `src/common`.
#[derive(Debug, Clone, Default)]
pub struct LibraryMap {
    rules: Vec<LibraryRule>,
}

impl LibraryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule. The prefix is normalised (separators, `.` segments, case).
    pub fn insert(&mut self, library: &str, prefix: &str) {
        let prefix = comparable(prefix);
        self.rules.push(LibraryRule {
            library: library.to_string(),
            prefix,
        });
        // Stable sort: equal-length prefixes keep insertion order.
        self.rules.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
    }

    /// Parse `lib_name:path/to/dir` command-line rules.
    ///
    /// A rule without `:` is discarded with a [`Diagnostic::MalformedLibraryRule`].
    pub fn add_cli_rules(&mut self, rules: &[String], diagnostics: &mut Diagnostics) {
        for rule in rules {
            match rule.split_once(':') {
                Some((library, path)) if !library.is_empty() => self.insert(library, path),
                _ => diagnostics.push(Diagnostic::MalformedLibraryRule { rule: rule.clone() }),
            }
        }
    }

    /// Logical library for a working-root-relative path.
    ///
    /// The longest matching prefix wins; `default_library` when nothing matches.
    pub fn classify<'a>(&'a self, relative_path: &str, default_library: &'a str) -> &'a str {
        let candidate = comparable(relative_path);
        self.rules
            .iter()
            .find(|rule| candidate.starts_with(&rule.prefix))
            .map(|rule| rule.library.as_str())
            .unwrap_or(default_library)
    }

    /// `(library, prefix)` pairs in matching order, for `--verbose` output.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules
            .iter()
            .map(|r| (r.library.as_str(), r.prefix.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_prefix_wins() {
        let mut map = LibraryMap::new();
        map.insert("libA", "src");
        map.insert("libB", "src/special");
        assert_eq!(map.classify("src/special/x.vhd", "work"), "libB");
        assert_eq!(map.classify("src/other/y.vhd", "work"), "libA");
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let mut map = LibraryMap::new();
        map.insert("libB", "src/special");
        map.insert("libA", "src");
        assert_eq!(map.classify("src/special/x.vhd", "work"), "libB");
    }

    #[test]
    fn test_unmatched_returns_default() {
        let mut map = LibraryMap::new();
        map.insert("common", "src/common");
        assert_eq!(map.classify("tb/top_tb.vhd", ""), "");
        assert_eq!(LibraryMap::new().classify("anything.vhd", "work"), "work");
    }

    #[test]
    fn test_case_and_separator_insensitive() {
        let mut map = LibraryMap::new();
        map.insert("common", "./Src/Common/");
        assert_eq!(map.classify("src\\COMMON\\fifo.vhd", "work"), "common");
    }

    #[test]
    fn test_cli_rules_skip_malformed() {
        let mut map = LibraryMap::new();
        let mut diags = Diagnostics::new();
        map.add_cli_rules(
            &["common:src/common".to_string(), "broken".to_string()],
            &mut diags,
        );
        assert_eq!(map.rules().count(), 1);
        assert_eq!(map.classify("src/common/a.vhd", ""), "common");
        assert_eq!(
            diags.iter().next(),
            Some(&Diagnostic::MalformedLibraryRule {
                rule: "broken".into()
            })
        );
    }

    #[test]
    fn test_cli_rule_path_may_contain_colon() {
        let mut map = LibraryMap::new();
        let mut diags = Diagnostics::new();
        map.add_cli_rules(&["vendor:ip:core".to_string()], &mut diags);
        assert!(diags.is_empty());
        assert_eq!(map.classify("ip:core/x.vhd", ""), "vendor");
    }
}
