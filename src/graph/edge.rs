/// The kind of directed edge between two files. Edges point from the
/// dependent file to the file it depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeKind {
    /// The source file references a design unit defined in the target file.
    Unit,
    /// The source file textually includes the target file.
    Include,
    /// A dependency that closed a cycle and was ignored for ordering.
    CycleBreak,
}
