use std::collections::HashSet;

use crate::index::FileId;

use super::EdgeSource;

/// One file on the traversal stack.
///
/// `edges` is `None` while the frame is unexpanded; once expanded, `cursor`
/// walks the edge list one entry at a time.
struct Frame {
    file: FileId,
    edges: Option<Vec<FileId>>,
    cursor: usize,
}

impl Frame {
    fn new(file: FileId) -> Self {
        Self {
            file,
            edges: None,
            cursor: 0,
        }
    }
}

/// Result of ordering the files reachable from a top-level file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileOrder {
    /// Dependencies before dependents; the top-level file is last.
    pub files: Vec<FileId>,
    /// Each detected cycle as the stack slice from the re-entered file to the
    /// file that closed it, with the re-entered file repeated at the end.
    pub cycles: Vec<Vec<FileId>>,
}

/// Depth-first post-order over the files reachable from `top`.
///
/// Uses an explicit frame stack rather than recursion, so arbitrarily deep
/// dependency chains cannot overflow the call stack. A file is emitted when
/// its last dependency has been emitted. An edge back to a file that is still
/// on the stack closes a cycle: it is recorded and skipped, and traversal
/// continues with the next edge, so every reachable file is emitted exactly once.
pub fn order_files<E: EdgeSource>(top: FileId, edges: &mut E) -> FileOrder {
    let mut order = FileOrder::default();
    let mut visited: HashSet<FileId> = HashSet::new();
    let mut on_stack: HashSet<FileId> = HashSet::new();
    let mut stack: Vec<Frame> = Vec::new();

    stack.push(Frame::new(top));
    visited.insert(top);
    on_stack.insert(top);

    while let Some(frame) = stack.last_mut() {
        if frame.edges.is_none() {
            frame.edges = Some(edges.dependencies(frame.file));
        }

        let mut next = None;
        let mut cycle_target = None;
        if let Some(list) = &frame.edges {
            while frame.cursor < list.len() {
                let target = list[frame.cursor];
                frame.cursor += 1;
                if on_stack.contains(&target) {
                    cycle_target = Some(target);
                    break;
                }
                if visited.contains(&target) {
                    continue;
                }
                next = Some(target);
                break;
            }
        }

        if let Some(target) = cycle_target {
            order.cycles.push(cycle_path(&stack, target));
            continue;
        }

        match next {
            Some(target) => {
                visited.insert(target);
                on_stack.insert(target);
                stack.push(Frame::new(target));
            }
            None => {
                if let Some(done) = stack.pop() {
                    on_stack.remove(&done.file);
                    order.files.push(done.file);
                }
            }
        }
    }

    order
}

fn cycle_path(stack: &[Frame], target: FileId) -> Vec<FileId> {
    let start = stack
        .iter()
        .position(|f| f.file == target)
        .unwrap_or(0);
    let mut path: Vec<FileId> = stack[start..].iter().map(|f| f.file).collect();
    path.push(target);
    path
}
