use std::fmt;

use serde::Serialize;

/// A non-fatal finding surfaced while indexing or resolving.
///
/// Paths are working-root-relative strings so the values can be asserted on
/// directly and serialised next to the compile order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A unit reference matched no definition.
    UnresolvedReference { file: String, symbol: String },
    /// An unqualified reference matched several definitions; `chosen` won by proximity.
    AmbiguousReference {
        file: String,
        symbol: String,
        candidates: Vec<String>,
        chosen: String,
    },
    /// A file-level cycle. `files` starts and ends with the same file; the
    /// closing edge was dropped.
    CircularDependency { files: Vec<String> },
    /// Libraries that could not be ordered because they depend on each other.
    CircularLibraryDependency { libraries: Vec<String> },
    /// A source file could not be read; it contributes nothing.
    UnreadableFile { file: String, reason: String },
    /// A `lib:path` rule without the `:` separator; the rule was discarded.
    MalformedLibraryRule { rule: String },
    /// A search root that does not exist (fatal only when every root is missing).
    MissingSearchRoot { path: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnresolvedReference { file, symbol } => {
                write!(f, "in {file}, dependency '{symbol}' could not be resolved")
            }
            Diagnostic::AmbiguousReference {
                file,
                symbol,
                candidates,
                chosen,
            } => write!(
                f,
                "in {file}, '{symbol}' is defined in {} places ({}); using closest: {chosen}",
                candidates.len(),
                candidates.join(", ")
            ),
            Diagnostic::CircularDependency { files } => {
                write!(f, "circular dependency: {}", files.join(" -> "))
            }
            Diagnostic::CircularLibraryDependency { libraries } => write!(
                f,
                "circular library dependency among: {}; falling back to discovery order",
                libraries.join(", ")
            ),
            Diagnostic::UnreadableFile { file, reason } => {
                write!(f, "could not read {file}: {reason}")
            }
            Diagnostic::MalformedLibraryRule { rule } => write!(
                f,
                "invalid library mapping '{rule}', skipping (expected 'lib_name:path/to/dir')"
            ),
            Diagnostic::MissingSearchRoot { path } => {
                write!(f, "search path not found: {path}")
            }
        }
    }
}

/// Ordered sink for [`Diagnostic`]s produced during one run.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count of unresolved references, for summaries.
    pub fn unresolved_count(&self) -> usize {
        self.iter()
            .filter(|d| matches!(d, Diagnostic::UnresolvedReference { .. }))
            .count()
    }

    /// Count of file- and library-level cycles, for summaries.
    pub fn cycle_count(&self) -> usize {
        self.iter()
            .filter(|d| {
                matches!(
                    d,
                    Diagnostic::CircularDependency { .. }
                        | Diagnostic::CircularLibraryDependency { .. }
                )
            })
            .count()
    }

    /// Write every diagnostic to stderr as a `warning:` line.
    ///
    /// Stderr keeps stdout clean for JSON consumers.
    pub fn print(&self) {
        for diagnostic in self.iter() {
            eprintln!("warning: {diagnostic}");
        }
    }
}
