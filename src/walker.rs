use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::language::DialectMap;

/// Walk every search root and collect recognised HDL source files.
///
/// Every file with a recognised extension is returned, including hidden and
/// `.gitignore`d ones; generated or vendor IP is often ignored by git but still
/// has to be compiled. The `exclude` globs are the only opt-out. Entries are
/// visited in file-name order so discovery order is stable across runs, and a
/// file reachable from several (overlapping) roots is reported once.
///
/// When `verbose` is true, each discovered file path is printed to stderr.
pub fn walk_sources(
    roots: &[PathBuf],
    dialects: &DialectMap,
    exclude: &[String],
    verbose: bool,
) -> Vec<PathBuf> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut files = Vec::new();

    for root in roots {
        for path in collect_files(root, dialects, exclude) {
            if seen.insert(path.clone()) {
                if verbose {
                    eprintln!("{}", path.display());
                }
                files.push(path);
            }
        }
    }

    files
}

/// Collect source files from a single directory tree using the `ignore` crate.
fn collect_files(root: &Path, dialects: &DialectMap, exclude: &[String]) -> Vec<PathBuf> {
    let walker = ignore::WalkBuilder::new(root)
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut out = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(e) => e,
            Err(err) => {
                eprintln!("warning: {err}");
                continue;
            }
        };

        let path = entry.path();

        if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
            continue;
        }

        if is_excluded(path, exclude) {
            continue;
        }

        if dialects.dialect_for(path).is_none() {
            continue;
        }

        out.push(path.to_path_buf());
    }
    out
}

/// Returns true if `path` matches any exclusion pattern, either as a whole or
/// through one of its components.
fn is_excluded(path: &Path, patterns: &[String]) -> bool {
    let path_str = path.to_string_lossy();

    for pattern in patterns {
        let Ok(matcher) = glob::Pattern::new(pattern) else {
            continue;
        };
        if matcher.matches(&path_str) {
            return true;
        }
        for component in path.components() {
            if let Some(s) = component.as_os_str().to_str()
                && matcher.matches(s)
            {
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("tempdir")
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.file_name().unwrap().to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_walk_returns_only_hdl_sources() {
        let dir = tmp();
        fs::write(dir.path().join("top.vhd"), "").unwrap();
        fs::write(dir.path().join("core.sv"), "").unwrap();
        fs::write(dir.path().join("README.md"), "# Hello").unwrap();
        fs::write(dir.path().join("defs.vh"), "").unwrap();

        let files = walk_sources(&[dir.path().to_path_buf()], &DialectMap::default(), &[], false);
        let names = names(&files);
        assert!(names.contains(&"top.vhd".to_string()));
        assert!(names.contains(&"core.sv".to_string()));
        assert!(!names.contains(&"README.md".to_string()));
        assert!(!names.contains(&"defs.vh".to_string()), "headers are not compile targets");
    }

    #[test]
    fn test_walk_is_sorted_and_deduplicated() {
        let dir = tmp();
        let sub = dir.path().join("rtl");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("b.vhd"), "").unwrap();
        fs::write(sub.join("a.vhd"), "").unwrap();

        // The second root is nested in the first: its files must not repeat.
        let roots = vec![dir.path().to_path_buf(), sub.clone()];
        let files = walk_sources(&roots, &DialectMap::default(), &[], false);
        assert_eq!(names(&files), vec!["a.vhd", "b.vhd"]);
    }

    #[test]
    fn test_walk_includes_gitignored_and_hidden_directories() {
        let dir = tmp();
        fs::write(dir.path().join(".gitignore"), "ip/\n").unwrap();
        fs::write(dir.path().join(".ignore"), "vendor/\n").unwrap();
        for sub in ["ip", ".gen", "vendor"] {
            fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        fs::write(dir.path().join("ip/core.vhd"), "").unwrap();
        fs::write(dir.path().join(".gen/pll.vhd"), "").unwrap();
        fs::write(dir.path().join("vendor/ram.v"), "").unwrap();
        fs::write(dir.path().join("top.vhd"), "").unwrap();

        let files = walk_sources(&[dir.path().to_path_buf()], &DialectMap::default(), &[], false);
        let mut names = names(&files);
        names.sort();
        assert_eq!(names, vec!["core.vhd", "pll.vhd", "ram.v", "top.vhd"]);
    }

    #[test]
    fn test_walk_respects_exclude_patterns() {
        let dir = tmp();
        let sim = dir.path().join("sim");
        fs::create_dir_all(&sim).unwrap();
        fs::write(sim.join("tb.vhd"), "").unwrap();
        fs::write(dir.path().join("dut.vhd"), "").unwrap();

        let files = walk_sources(
            &[dir.path().to_path_buf()],
            &DialectMap::default(),
            &["sim".to_string()],
            false,
        );
        assert_eq!(names(&files), vec!["dut.vhd"]);
    }
}
