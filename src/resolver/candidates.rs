use std::path::Path;

use crate::index::{FileId, UnitIndex, UnitKey};
use crate::parser::{LibraryHint, UnitReference};
use crate::paths::common_prefix_len;

/// Outcome of resolving one unit reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateResolution {
    /// No definition matched.
    Unresolved,
    /// Exactly one definition matched.
    Resolved(FileId),
    /// Several definitions matched; `chosen` is the closest to the referencing file.
    Ambiguous {
        chosen: FileId,
        candidates: Vec<FileId>,
    },
}

impl CandidateResolution {
    pub fn file(&self) -> Option<FileId> {
        match self {
            CandidateResolution::Unresolved => None,
            CandidateResolution::Resolved(file) => Some(*file),
            CandidateResolution::Ambiguous { chosen, .. } => Some(*chosen),
        }
    }
}

/// Collect every file that could satisfy `reference`.
///
/// An explicit library is a hard directive: only that `(library, unit)` key is
/// consulted. Implicit and `work` references search every library.
pub fn gather(reference: &UnitReference, index: &UnitIndex) -> Vec<FileId> {
    match &reference.hint {
        LibraryHint::Named(library) => index
            .definitions(&UnitKey::new(library, &reference.name))
            .to_vec(),
        LibraryHint::DefaultOnly => index
            .definitions(&UnitKey::new(index.default_library(), &reference.name))
            .to_vec(),
        LibraryHint::Implicit | LibraryHint::Work => {
            index.definitions_in_any_library(&reference.name)
        }
    }
}

/// Pick the candidate whose directory shares the most leading components with
/// `referencing_dir`. Ties keep the earliest candidate.
///
/// `candidates` must be non-empty.
pub fn closest(candidates: &[FileId], index: &UnitIndex, referencing_dir: &Path) -> FileId {
    let mut best = candidates[0];
    let mut best_len = shared_len(best, index, referencing_dir);
    for &candidate in &candidates[1..] {
        let len = shared_len(candidate, index, referencing_dir);
        if len > best_len {
            best = candidate;
            best_len = len;
        }
    }
    best
}

fn shared_len(file: FileId, index: &UnitIndex, referencing_dir: &Path) -> usize {
    let dir = index.file(file).path.parent().unwrap_or(Path::new(""));
    common_prefix_len(dir, referencing_dir)
}

/// Resolve `reference` made from a file in `referencing_dir` to at most one file.
pub fn resolve(
    reference: &UnitReference,
    index: &UnitIndex,
    referencing_dir: &Path,
) -> CandidateResolution {
    let candidates = gather(reference, index);
    match candidates.len() {
        0 => CandidateResolution::Unresolved,
        1 => CandidateResolution::Resolved(candidates[0]),
        _ => CandidateResolution::Ambiguous {
            chosen: closest(&candidates, index, referencing_dir),
            candidates,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::index::SourceFile;
    use crate::language::Dialect;
    use crate::parser::{UnitDefinition, UnitKind};

    fn add(index: &mut UnitIndex, path: &str, library: &str, unit: &str) -> FileId {
        index.add_file(
            SourceFile {
                path: PathBuf::from(path),
                relative: path.trim_start_matches("/proj/").to_string(),
                library: library.to_string(),
                dialect: Some(Dialect::Vhdl),
            },
            &[UnitDefinition {
                name: unit.to_string(),
                kind: UnitKind::Package,
            }],
        )
    }

    fn reference(hint: LibraryHint, name: &str) -> UnitReference {
        UnitReference {
            hint,
            name: name.to_string(),
            text: name.to_string(),
            speculative: false,
        }
    }

    #[test]
    fn test_ambiguity_resolved_by_proximity() {
        let mut index = UnitIndex::new("");
        let far = add(&mut index, "/proj/c/def2.vhd", "lib_c", "shared");
        let near = add(&mut index, "/proj/a/b/def1.vhd", "lib_b", "shared");

        let r = reference(LibraryHint::Implicit, "shared");
        let got = resolve(&r, &index, Path::new("/proj/a"));
        assert_eq!(
            got,
            CandidateResolution::Ambiguous {
                chosen: near,
                candidates: vec![far, near],
            }
        );
    }

    #[test]
    fn test_proximity_tie_keeps_first_seen() {
        let mut index = UnitIndex::new("");
        let first = add(&mut index, "/proj/x/one.vhd", "l1", "dup");
        let _second = add(&mut index, "/proj/y/two.vhd", "l2", "dup");

        let r = reference(LibraryHint::Work, "dup");
        assert_eq!(resolve(&r, &index, Path::new("/proj/z")).file(), Some(first));
    }

    #[test]
    fn test_explicit_library_is_hard_directive() {
        let mut index = UnitIndex::new("");
        add(&mut index, "/proj/q/pkg.vhd", "q", "types");

        let r = reference(LibraryHint::Named("p".into()), "types");
        assert_eq!(
            resolve(&r, &index, Path::new("/proj/q")),
            CandidateResolution::Unresolved
        );

        let r = reference(LibraryHint::Named("q".into()), "types");
        assert!(matches!(
            resolve(&r, &index, Path::new("/proj")),
            CandidateResolution::Resolved(_)
        ));
    }

    #[test]
    fn test_implicit_reference_searches_all_libraries() {
        let mut index = UnitIndex::new("work_default");
        let only = add(&mut index, "/proj/lib/pkg.vhd", "other", "cfg");

        let r = reference(LibraryHint::Implicit, "cfg");
        assert_eq!(
            resolve(&r, &index, Path::new("/proj")),
            CandidateResolution::Resolved(only)
        );
    }

    #[test]
    fn test_default_only_ignores_other_libraries() {
        let mut index = UnitIndex::new("");
        add(&mut index, "/proj/lib/pkg.vhd", "other", "cfg");

        let r = reference(LibraryHint::DefaultOnly, "cfg");
        assert!(gather(&r, &index).is_empty());
    }
}
