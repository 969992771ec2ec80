/// Metadata about a file in the resolved graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    /// Working-root-relative path.
    pub relative: String,
    /// Logical library; `None` for include files.
    pub library: Option<String>,
}
