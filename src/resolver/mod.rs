pub mod candidates;

pub use candidates::{CandidateResolution, resolve as resolve_candidate};

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::graph::FileGraph;
use crate::graph::edge::EdgeKind;
use crate::graph::node::FileNode;
use crate::index::{FileId, FileTable, IndexSettings, SourceFile, UnitIndex, build_index};
use crate::language::{Dialect, DialectMap};
use crate::library::LibraryMap;
use crate::order::{EdgeSource, build_library_graph, order_files, order_libraries};
use crate::parser::{LibraryHint, UnitReference, extract_file};
use crate::paths::absolutize;
use crate::walker::walk_sources;

/// Inputs of one resolution run, after CLI and config have been merged.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Top-level file (absolute or relative to `working_root`).
    pub top_level: PathBuf,
    /// Directories searched for design units.
    pub search_roots: Vec<PathBuf>,
    /// Absolute root that relative paths and library rules are computed against.
    pub working_root: PathBuf,
    pub default_library: String,
    pub libraries: LibraryMap,
    pub dialects: DialectMap,
    /// Lowercase library names whose units are provided by the tool (ieee, std, ...).
    pub external_libraries: Vec<String>,
    /// Glob patterns excluded from discovery.
    pub exclude: Vec<String>,
    pub verbose: bool,
}

impl ResolveOptions {
    fn index_settings(&self) -> IndexSettings<'_> {
        IndexSettings {
            working_root: &self.working_root,
            libraries: &self.libraries,
            dialects: &self.dialects,
            default_library: &self.default_library,
        }
    }
}

/// Memoising edge function: reference extraction plus candidate resolution.
///
/// Starts from the indexed files and grows its own file table as include
/// targets outside the index are discovered. Each file is extracted at most
/// once, so each diagnostic about a file is reported once.
pub struct DependencyResolver<'a> {
    index: &'a UnitIndex,
    settings: IndexSettings<'a>,
    external_libraries: &'a [String],
    files: FileTable,
    edges: HashMap<FileId, Vec<(FileId, EdgeKind)>>,
    includes: HashSet<FileId>,
    /// Grammar for include targets whose extension maps to no dialect.
    inherited: HashMap<FileId, Dialect>,
    diagnostics: Diagnostics,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(
        index: &'a UnitIndex,
        settings: IndexSettings<'a>,
        external_libraries: &'a [String],
    ) -> Self {
        Self {
            index,
            settings,
            external_libraries,
            files: index.files().clone(),
            edges: HashMap::new(),
            includes: HashSet::new(),
            inherited: HashMap::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Id of the file at `path`, registering it if it was not indexed.
    pub fn file_id(&mut self, path: &Path) -> FileId {
        let path = absolutize(path, self.settings.working_root);
        match self.files.lookup(&path) {
            Some(id) => id,
            None => self.files.insert(self.settings.describe(&path)),
        }
    }

    pub fn file(&self, id: FileId) -> &SourceFile {
        self.files.get(id)
    }

    /// Whether `id` was reached through a textual inclusion.
    pub fn is_include(&self, id: FileId) -> bool {
        self.includes.contains(&id)
    }

    /// Direct, deduplicated dependencies of `file` with the kind of each edge.
    pub fn direct_edges(&mut self, file: FileId) -> &[(FileId, EdgeKind)] {
        if !self.edges.contains_key(&file) {
            let computed = self.compute_edges(file);
            self.edges.insert(file, computed);
        }
        &self.edges[&file]
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    fn compute_edges(&mut self, file: FileId) -> Vec<(FileId, EdgeKind)> {
        let source = self.files.get(file).clone();
        let Some(dialect) = source.dialect.or_else(|| self.inherited.get(&file).copied()) else {
            return Vec::new();
        };
        let dir = source.path.parent().unwrap_or(Path::new("/")).to_path_buf();
        let extraction = extract_file(&source.path, dialect);
        if extraction.is_empty() {
            return Vec::new();
        }

        let mut out: Vec<(FileId, EdgeKind)> = Vec::new();
        let push = |out: &mut Vec<(FileId, EdgeKind)>, target: FileId, kind: EdgeKind| {
            if target != file && !out.iter().any(|(t, _)| *t == target) {
                out.push((target, kind));
            }
        };

        for include in &extraction.includes {
            let id = match self.files.lookup(include) {
                Some(id) => id,
                None => self.files.insert(self.settings.describe(include)),
            };
            // Headers like `.vh` are read with the includer's grammar, but keep
            // no dialect of their own so they are listed as `unknown`.
            if self.files.get(id).dialect.is_none() {
                self.inherited.entry(id).or_insert(dialect);
            }
            self.includes.insert(id);
            push(&mut out, id, EdgeKind::Include);
        }

        let mut reported: HashSet<String> = HashSet::new();
        for reference in &extraction.units {
            let resolution = resolve_candidate(reference, self.index, &dir);
            match &resolution {
                CandidateResolution::Ambiguous { chosen, candidates } => {
                    if reported.insert(reference.text.to_lowercase()) {
                        self.diagnostics.push(Diagnostic::AmbiguousReference {
                            file: source.relative.clone(),
                            symbol: reference.text.clone(),
                            candidates: candidates
                                .iter()
                                .map(|c| self.index.file(*c).relative.clone())
                                .collect(),
                            chosen: self.index.file(*chosen).relative.clone(),
                        });
                    }
                }
                CandidateResolution::Unresolved => {
                    if self.should_report_unresolved(reference)
                        && reported.insert(reference.text.to_lowercase())
                    {
                        self.diagnostics.push(Diagnostic::UnresolvedReference {
                            file: source.relative.clone(),
                            symbol: reference.text.clone(),
                        });
                    }
                }
                CandidateResolution::Resolved(_) => {}
            }
            if let Some(target) = resolution.file() {
                push(&mut out, target, EdgeKind::Unit);
            }
        }

        out
    }

    fn should_report_unresolved(&self, reference: &UnitReference) -> bool {
        if reference.speculative {
            return false;
        }
        match &reference.hint {
            LibraryHint::Named(library) => !self.external_libraries.contains(library),
            _ => true,
        }
    }
}

impl EdgeSource for DependencyResolver<'_> {
    fn dependencies(&mut self, file: FileId) -> Vec<FileId> {
        self.direct_edges(file).iter().map(|(id, _)| *id).collect()
    }

    fn library(&self, file: FileId) -> Option<String> {
        if self.is_include(file) {
            None
        } else {
            Some(self.file(file).library.clone())
        }
    }
}

/// One entry of the final compile order.
#[derive(Debug, Clone)]
pub struct ResolvedFile {
    pub id: FileId,
    pub source: SourceFile,
    pub is_include: bool,
}

impl ResolvedFile {
    /// Logical library, empty for include files.
    pub fn logical_name(&self) -> &str {
        if self.is_include {
            ""
        } else {
            &self.source.library
        }
    }
}

/// Everything produced by one resolution run.
pub struct Resolution {
    /// Dependencies before dependents; the top-level file is last.
    pub files: Vec<ResolvedFile>,
    /// Libraries, dependencies first.
    pub libraries: Vec<String>,
    /// The resolved file graph, for export.
    pub graph: FileGraph,
    pub diagnostics: Diagnostics,
    /// Files discovered under the search roots.
    pub indexed_files: usize,
    /// Distinct `(library, unit)` keys in the index.
    pub unit_count: usize,
}

/// Discover and index every source file under the search roots.
///
/// Missing roots are reported; it is an error only when all of them are missing.
pub fn index_project(options: &ResolveOptions, diagnostics: &mut Diagnostics) -> Result<UnitIndex> {
    let mut roots = Vec::new();
    for root in &options.search_roots {
        let abs = absolutize(root, &options.working_root);
        if abs.is_dir() {
            roots.push(abs);
        } else {
            diagnostics.push(Diagnostic::MissingSearchRoot {
                path: root.display().to_string(),
            });
        }
    }
    if roots.is_empty() {
        bail!("search path not found: no existing directory among the search roots");
    }

    if options.verbose {
        eprintln!("Scanning for HDL files in {} root(s)...", roots.len());
    }
    let sources = walk_sources(&roots, &options.dialects, &options.exclude, options.verbose);
    let index = build_index(&sources, &options.index_settings(), diagnostics);
    if options.verbose {
        eprintln!(
            "Found {} unique design units across {} files.",
            index.unit_count(),
            index.files().len()
        );
    }
    Ok(index)
}

/// Run the full pipeline: index, order files from the top level, order libraries.
pub fn resolve_project(options: &ResolveOptions) -> Result<Resolution> {
    let top_path = absolutize(&options.top_level, &options.working_root);
    if !top_path.is_file() {
        bail!(
            "top-level file not found at '{}'",
            options.top_level.display()
        );
    }

    let mut diagnostics = Diagnostics::new();
    let index = index_project(options, &mut diagnostics)?;

    let mut resolver =
        DependencyResolver::new(&index, options.index_settings(), &options.external_libraries);
    let top = resolver.file_id(&top_path);

    if options.verbose {
        eprintln!(
            "Resolving dependency tree starting from '{}'...",
            resolver.file(top).relative
        );
    }
    let file_order = order_files(top, &mut resolver);

    for cycle in &file_order.cycles {
        diagnostics.push(Diagnostic::CircularDependency {
            files: cycle
                .iter()
                .map(|id| resolver.file(*id).relative.clone())
                .collect(),
        });
    }

    let library_graph = build_library_graph(&file_order.files, &mut resolver);
    let library_order = order_libraries(&library_graph);
    if let Some(stuck) = &library_order.cycle {
        diagnostics.push(Diagnostic::CircularLibraryDependency {
            libraries: stuck.clone(),
        });
    }

    let files: Vec<ResolvedFile> = file_order
        .files
        .iter()
        .map(|&id| ResolvedFile {
            id,
            source: resolver.file(id).clone(),
            is_include: resolver.is_include(id),
        })
        .collect();

    if files.is_empty() {
        bail!("could not resolve any files");
    }

    if options.verbose {
        for f in &files {
            eprintln!("  -> Added {}", f.source.relative);
        }
    }

    let closing_edges: HashSet<(FileId, FileId)> = file_order
        .cycles
        .iter()
        .filter_map(|c| match c.as_slice() {
            [.., from, to] => Some((*from, *to)),
            _ => None,
        })
        .collect();
    let graph = build_file_graph(&files, &mut resolver, &closing_edges);

    diagnostics.extend(resolver.into_diagnostics());

    Ok(Resolution {
        files,
        libraries: library_order.libraries,
        graph,
        diagnostics,
        indexed_files: index.files().len(),
        unit_count: index.unit_count(),
    })
}

fn build_file_graph(
    files: &[ResolvedFile],
    resolver: &mut DependencyResolver<'_>,
    closing_edges: &HashSet<(FileId, FileId)>,
) -> FileGraph {
    let mut graph = FileGraph::new();
    for f in files {
        graph.add_file(
            f.id,
            FileNode {
                relative: f.source.relative.clone(),
                library: (!f.is_include).then(|| f.source.library.clone()),
            },
        );
    }
    for f in files {
        let edges = resolver.direct_edges(f.id).to_vec();
        for (target, kind) in edges {
            if closing_edges.contains(&(f.id, target)) {
                graph.add_cycle_edge(f.id, target);
            } else {
                graph.add_dependency(f.id, target, kind);
            }
        }
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn options(root: &Path, top: &str) -> ResolveOptions {
        ResolveOptions {
            top_level: PathBuf::from(top),
            search_roots: vec![root.to_path_buf()],
            working_root: root.to_path_buf(),
            default_library: String::new(),
            libraries: LibraryMap::new(),
            dialects: DialectMap::default(),
            external_libraries: vec!["ieee".into(), "std".into()],
            exclude: Vec::new(),
            verbose: false,
        }
    }

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn order(resolution: &Resolution) -> Vec<&str> {
        resolution
            .files
            .iter()
            .map(|f| f.source.relative.as_str())
            .collect()
    }

    #[test]
    fn test_vhdl_project_orders_dependencies_first() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "pkg/types.vhd", "package types is\nend package;\n");
        write(
            root,
            "rtl/fifo.vhd",
            "library ieee;\nuse ieee.std_logic_1164.all;\nuse work.types.all;\nentity fifo is\nend entity;\n",
        );
        write(
            root,
            "top.vhd",
            "use work.types.all;\nentity top is\nend entity;\narchitecture rtl of top is\nbegin\n  u0 : entity work.fifo;\nend architecture;\n",
        );

        let resolution = resolve_project(&options(root, "top.vhd")).unwrap();
        assert_eq!(order(&resolution), vec!["pkg/types.vhd", "rtl/fifo.vhd", "top.vhd"]);
        // ieee is external: no warning.
        assert!(resolution.diagnostics.is_empty(), "{:?}", resolution.diagnostics);
    }

    #[test]
    fn test_unreferenced_files_are_not_emitted() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "top.vhd", "entity top is\nend entity;\n");
        write(root, "unused.vhd", "entity unused is\nend entity;\n");

        let resolution = resolve_project(&options(root, "top.vhd")).unwrap();
        assert_eq!(order(&resolution), vec!["top.vhd"]);
        assert_eq!(resolution.indexed_files, 2);
    }

    #[test]
    fn test_include_files_have_no_library() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "inc/defs.vh", "`define WIDTH 8\n");
        write(root, "rtl/core.v", "`include \"../inc/defs.vh\"\nmodule core (input clk);\nendmodule\n");
        write(root, "top.v", "module top (input clk);\n  core u_core (.clk(clk));\nendmodule\n");

        let mut opts = options(root, "top.v");
        opts.libraries.insert("rtl_lib", "rtl");
        let resolution = resolve_project(&opts).unwrap();

        assert_eq!(order(&resolution), vec!["inc/defs.vh", "rtl/core.v", "top.v"]);
        let inc = &resolution.files[0];
        assert!(inc.is_include);
        assert_eq!(inc.logical_name(), "");
        assert_eq!(resolution.files[1].logical_name(), "rtl_lib");
        // The include never shows up as a library.
        assert_eq!(resolution.libraries, vec!["rtl_lib", ""]);
    }

    #[test]
    fn test_unknown_extension_header_is_parsed_but_has_no_dialect() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "inc/defs.vh", "`include \"more.vh\"\n`define WIDTH 8\n");
        write(root, "inc/more.vh", "`define DEPTH 4\n");
        write(root, "top.v", "`include \"inc/defs.vh\"\nmodule top (input clk);\nendmodule\n");

        let resolution = resolve_project(&options(root, "top.v")).unwrap();

        // The nested include is followed through the inherited Verilog grammar.
        assert_eq!(order(&resolution), vec!["inc/more.vh", "inc/defs.vh", "top.v"]);
        assert_eq!(resolution.files[0].source.dialect, None);
        assert_eq!(resolution.files[1].source.dialect, None);
        assert_eq!(resolution.files[2].source.dialect, Some(Dialect::Verilog));
    }

    #[test]
    fn test_cycle_is_reported_and_both_files_emitted_once() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "x.vhd", "use work.y_pkg.all;\npackage x_pkg is\nend package;\n");
        write(root, "y.vhd", "use work.x_pkg.all;\npackage y_pkg is\nend package;\n");

        let resolution = resolve_project(&options(root, "x.vhd")).unwrap();
        assert_eq!(order(&resolution), vec!["y.vhd", "x.vhd"]);
        assert!(resolution.diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::CircularDependency { files } if files == &vec!["x.vhd", "y.vhd", "x.vhd"]
        )));
        assert_eq!(resolution.graph.file_count(), 2);
    }

    #[test]
    fn test_explicit_library_miss_is_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "q/types.vhd", "package types is\nend package;\n");
        write(root, "top.vhd", "use other.types.all;\nentity top is\nend entity;\n");

        let mut opts = options(root, "top.vhd");
        opts.libraries.insert("q", "q");
        let resolution = resolve_project(&opts).unwrap();

        assert_eq!(order(&resolution), vec!["top.vhd"]);
        assert_eq!(
            resolution.diagnostics.iter().collect::<Vec<_>>(),
            vec![&Diagnostic::UnresolvedReference {
                file: "top.vhd".into(),
                symbol: "other.types".into(),
            }]
        );
    }

    #[test]
    fn test_library_order_follows_cross_library_edges() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "q/base.vhd", "package base is\nend package;\n");
        write(root, "p/app.vhd", "use q.base.all;\nentity app is\nend entity;\n");

        let mut opts = options(root, "p/app.vhd");
        opts.libraries.insert("p", "p");
        opts.libraries.insert("q", "q");
        let resolution = resolve_project(&opts).unwrap();
        assert_eq!(resolution.libraries, vec!["q", "p"]);
    }

    #[test]
    fn test_ambiguous_reference_prefers_nearby_definition() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "a/b/def1.vhd", "package shared is\nend package;\n");
        write(root, "c/def2.vhd", "package shared is\nend package;\n");
        write(root, "a/ref.vhd", "use shared.all;\nentity r is\nend entity;\n");

        let mut opts = options(root, "a/ref.vhd");
        opts.libraries.insert("lib_ab", "a/b");
        opts.libraries.insert("lib_c", "c");
        let resolution = resolve_project(&opts).unwrap();

        assert_eq!(order(&resolution), vec!["a/b/def1.vhd", "a/ref.vhd"]);
        assert!(resolution.diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::AmbiguousReference { chosen, .. } if chosen == "a/b/def1.vhd"
        )));
    }

    #[test]
    fn test_runs_are_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "pkg.vhd", "package p is\nend package;\n");
        for i in 0..8 {
            write(
                root,
                &format!("leaf{i}.vhd"),
                &format!("use work.p.all;\nentity leaf{i} is\nend entity;\n"),
            );
        }
        let body: String = (0..8).map(|i| format!("u{i} : entity work.leaf{i};\n")).collect();
        write(root, "top.vhd", &format!("entity top is\nend entity;\n{body}"));

        let first = resolve_project(&options(root, "top.vhd")).unwrap();
        let second = resolve_project(&options(root, "top.vhd")).unwrap();
        assert_eq!(order(&first), order(&second));
        assert_eq!(first.files.len(), 10);
    }

    #[test]
    fn test_missing_top_level_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_project(&options(dir.path(), "nope.vhd"))
            .err()
            .expect("missing top level must fail");
        assert!(err.to_string().contains("top-level file not found"));
    }

    #[test]
    fn test_all_search_roots_missing_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "top.vhd", "entity top is\nend entity;\n");
        let mut opts = options(dir.path(), "top.vhd");
        opts.search_roots = vec![dir.path().join("missing")];
        assert!(resolve_project(&opts).is_err());
    }

    #[test]
    fn test_some_search_roots_missing_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "top.vhd", "entity top is\nend entity;\n");
        let mut opts = options(dir.path(), "top.vhd");
        opts.search_roots.push(dir.path().join("missing"));
        let resolution = resolve_project(&opts).unwrap();
        assert!(matches!(
            resolution.diagnostics.iter().next(),
            Some(Diagnostic::MissingSearchRoot { .. })
        ));
    }
}
