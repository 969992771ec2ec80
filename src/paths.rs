use std::path::{Component, Path, PathBuf};

/// Make `path` absolute (against `base` when relative) and lexically normalise it.
///
/// `.` components are dropped and `..` pops the previous component. The file
/// system is never consulted, so the result is stable for paths that do not
/// exist yet (e.g. an `` `include`` target being probed).
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    normalize(&joined)
}

/// Lexically normalise a path without touching the file system.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` is `/`.
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Identity key for a source file: absolute, normalised and case-folded on
/// case-insensitive platforms.
pub fn identity(path: &Path) -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(path.to_string_lossy().to_lowercase())
    } else {
        path.to_path_buf()
    }
}

/// Render `path` relative to `base` with `/` separators.
///
/// Falls back to `..` segments when `path` is outside `base`. Both paths are
/// expected to be absolute and normalised.
pub fn relative_to(path: &Path, base: &Path) -> String {
    let path_parts: Vec<Component> = path.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    let shared = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    // Different roots (e.g. different drive letters): nothing to relativise against.
    if shared == 0 && path.is_absolute() {
        return to_slash(path);
    }

    let mut parts: Vec<String> = Vec::new();
    for _ in shared..base_parts.len() {
        parts.push("..".to_string());
    }
    for component in &path_parts[shared..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Lowercased, `/`-separated, normalised form used for prefix comparisons.
pub fn comparable(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let normalized = normalize(Path::new(&unified));
    to_slash(&normalized).to_lowercase()
}

/// Number of leading path components shared by two directories.
pub fn common_prefix_len(a: &Path, b: &Path) -> usize {
    a.components()
        .zip(b.components())
        .take_while(|(x, y)| x == y)
        .count()
}

fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
