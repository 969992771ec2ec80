use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::language::{Dialect, DialectFamily, DialectMap};
use crate::library::LibraryMap;
use crate::parser::{UnitDefinition, read_source, scan_definitions};
use crate::paths::{absolutize, identity, relative_to};

/// Position of a file in a [`FileTable`]. Discovery order, so smaller ids were seen first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub usize);

/// A discovered source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute, lexically normalised path.
    pub path: PathBuf,
    /// Path relative to the working root, `/`-separated.
    pub relative: String,
    /// Logical library assigned from the path-prefix rules.
    pub library: String,
    /// Dialect by extension; `None` for include targets with unrecognised extensions.
    pub dialect: Option<Dialect>,
}

/// `(library, unit)` pair, both case-folded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitKey {
    pub library: String,
    pub name: String,
}

impl UnitKey {
    pub fn new(library: &str, name: &str) -> Self {
        Self {
            library: library.to_lowercase(),
            name: name.to_lowercase(),
        }
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.library.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.library, self.name)
        }
    }
}

/// Arena of source files with O(1) lookup by case-normalised path.
#[derive(Debug, Clone, Default)]
pub struct FileTable {
    files: Vec<SourceFile>,
    by_identity: HashMap<PathBuf, FileId>,
}

impl FileTable {
    /// Add a file. If a file with the same identity exists, returns its id.
    pub fn insert(&mut self, file: SourceFile) -> FileId {
        let key = identity(&file.path);
        if let Some(&existing) = self.by_identity.get(&key) {
            return existing;
        }
        let id = FileId(self.files.len());
        self.files.push(file);
        self.by_identity.insert(key, id);
        id
    }

    pub fn lookup(&self, path: &Path) -> Option<FileId> {
        self.by_identity.get(&identity(path)).copied()
    }

    pub fn get(&self, id: FileId) -> &SourceFile {
        &self.files[id.0]
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Multi-valued map from [`UnitKey`] to the files defining it.
///
/// Buckets keep discovery order and may hold several files: that is the
/// ambiguity case, resolved downstream, not an error.
#[derive(Debug, Clone, Default)]
pub struct UnitIndex {
    files: FileTable,
    units: HashMap<UnitKey, Vec<FileId>>,
    by_name: HashMap<String, Vec<FileId>>,
    default_library: String,
}

impl UnitIndex {
    pub fn new(default_library: &str) -> Self {
        Self {
            default_library: default_library.to_lowercase(),
            ..Self::default()
        }
    }

    /// Register a file and its definitions.
    ///
    /// Library-aware definitions land in the file's library; library-unaware
    /// ones (Verilog) always land in the default library.
    pub fn add_file(&mut self, file: SourceFile, definitions: &[UnitDefinition]) -> FileId {
        let library = match file.dialect.map(|d| d.family()) {
            Some(DialectFamily::LibraryAware) => file.library.to_lowercase(),
            _ => self.default_library.clone(),
        };
        let id = self.files.insert(file);
        for def in definitions {
            self.add_definition(UnitKey::new(&library, &def.name), id);
        }
        id
    }

    fn add_definition(&mut self, key: UnitKey, file: FileId) {
        let by_name = self.by_name.entry(key.name.clone()).or_default();
        if !by_name.contains(&file) {
            by_name.push(file);
        }
        let bucket = self.units.entry(key).or_default();
        if !bucket.contains(&file) {
            bucket.push(file);
        }
    }

    /// Files defining exactly `key`, in discovery order.
    pub fn definitions(&self, key: &UnitKey) -> &[FileId] {
        self.units.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Files defining a unit called `name` in any library, in discovery order.
    pub fn definitions_in_any_library(&self, name: &str) -> Vec<FileId> {
        let mut files = self.by_name.get(name).cloned().unwrap_or_default();
        files.sort();
        files
    }

    pub fn files(&self) -> &FileTable {
        &self.files
    }

    pub fn file(&self, id: FileId) -> &SourceFile {
        self.files.get(id)
    }

    pub fn default_library(&self) -> &str {
        &self.default_library
    }

    /// Number of distinct `(library, unit)` keys.
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// All keys with their defining files, sorted by key.
    pub fn entries(&self) -> Vec<(&UnitKey, &[FileId])> {
        let mut entries: Vec<(&UnitKey, &[FileId])> = self
            .units
            .iter()
            .map(|(k, v)| (k, v.as_slice()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

/// Everything the indexer needs besides the list of files.
pub struct IndexSettings<'a> {
    /// Root that relative paths (and therefore library rules) are computed against.
    pub working_root: &'a Path,
    pub libraries: &'a LibraryMap,
    pub dialects: &'a DialectMap,
    pub default_library: &'a str,
}

impl IndexSettings<'_> {
    /// Describe a file at `path` (absolute): relative path, library, dialect.
    pub fn describe(&self, path: &Path) -> SourceFile {
        let path = absolutize(path, self.working_root);
        let relative = relative_to(&path, self.working_root);
        let library = self
            .libraries
            .classify(&relative, self.default_library)
            .to_string();
        let dialect = self.dialects.dialect_for(&path);
        SourceFile {
            path,
            relative,
            library,
            dialect,
        }
    }
}

/// Build the unit index over already-discovered `files`.
///
/// Files are read and scanned in parallel; results are collected in discovery
/// order and merged on this thread so bucket order matches discovery order.
/// Unreadable files are kept in the file table (their library still matters)
/// but contribute no definitions.
pub fn build_index(
    files: &[PathBuf],
    settings: &IndexSettings<'_>,
    diagnostics: &mut Diagnostics,
) -> UnitIndex {
    let scanned: Vec<(SourceFile, Result<Vec<UnitDefinition>, String>)> = files
        .par_iter()
        .map(|path| {
            let file = settings.describe(path);
            let defs = match file.dialect {
                Some(dialect) => read_source(&file.path)
                    .map(|source| scan_definitions(dialect, &source))
                    .map_err(|e| e.to_string()),
                None => Ok(Vec::new()),
            };
            (file, defs)
        })
        .collect();

    let mut index = UnitIndex::new(settings.default_library);
    for (file, defs) in scanned {
        match defs {
            Ok(defs) => {
                index.add_file(file, &defs);
            }
            Err(reason) => {
                diagnostics.push(Diagnostic::UnreadableFile {
                    file: file.relative.clone(),
                    reason,
                });
                index.add_file(file, &[]);
            }
        }
    }
    index
}
