pub mod files;
pub mod libraries;

pub use files::order_files;
pub use libraries::{build_library_graph, order_libraries};

use crate::index::FileId;

/// Edge function over files: what a file directly depends on.
///
/// Implementations may compute edges lazily and memoise them; the orderers
/// only ask, in a deterministic sequence.
pub trait EdgeSource {
    /// Files `file` must be ordered after, deduplicated, in a stable order.
    fn dependencies(&mut self, file: FileId) -> Vec<FileId>;

    /// Logical library of `file`, or `None` when it is not a compilation
    /// target (include files).
    fn library(&self, file: FileId) -> Option<String>;
}
