use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Serialize;

use crate::diagnostics::Diagnostics;
use crate::index::UnitIndex;
use crate::language::VhdlStandard;
use crate::resolver::{Resolution, ResolvedFile};

/// Key under which the default (work) library is listed in the library dictionary.
pub const WORK_LIBRARY_KEY: &str = "work";

/// One file of the compile order, as written to the project file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileEntry {
    /// Working-root-relative path, `/`-separated.
    pub name: String,
    pub file_type: String,
    pub is_include_file: bool,
    /// Logical library; empty for include files.
    pub logical_name: String,
}

/// GHDL tool block of a TerosHDL project file. Left empty for the user to fill in.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GhdlOptions {
    pub installation_path: String,
    pub waveform: String,
    pub analyze_options: String,
    pub run_options: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolOptions {
    pub ghdl: GhdlOptions,
}

/// A TerosHDL project file.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectFile {
    pub name: String,
    pub toplevel: String,
    pub files: Vec<CompileEntry>,
    pub tool_options: ToolOptions,
}

/// Machine-readable report printed by `resolve --json`.
#[derive(Debug, Serialize)]
pub struct ResolveReport<'a> {
    pub project: &'a ProjectFile,
    pub libraries: &'a IndexMap<String, Vec<String>>,
    pub library_order: &'a [String],
    pub diagnostics: &'a Diagnostics,
    pub indexed_files: usize,
    pub unit_count: usize,
}

fn file_type(file: &ResolvedFile, vhdl_std: VhdlStandard) -> String {
    match file.source.dialect {
        Some(dialect) => dialect.file_type(vhdl_std),
        None => "unknown".to_string(),
    }
}

/// Compile-order records, dependencies first.
pub fn compile_entries(resolution: &Resolution, vhdl_std: VhdlStandard) -> Vec<CompileEntry> {
    resolution
        .files
        .iter()
        .map(|f| CompileEntry {
            name: f.source.relative.clone(),
            file_type: file_type(f, vhdl_std),
            is_include_file: f.is_include,
            logical_name: f.logical_name().to_string(),
        })
        .collect()
}

/// Assemble the project file. The top level is the last file of the order.
pub fn project_file(resolution: &Resolution, name: &str, vhdl_std: VhdlStandard) -> ProjectFile {
    let toplevel = resolution
        .files
        .last()
        .map(|f| f.source.relative.clone())
        .unwrap_or_default();
    ProjectFile {
        name: name.to_string(),
        toplevel,
        files: compile_entries(resolution, vhdl_std),
        tool_options: ToolOptions::default(),
    }
}

/// Library -> member files, libraries in dependency order, files in compile order.
///
/// Include files are left out. The default library is listed as `work`.
pub fn library_sources(
    resolution: &Resolution,
    default_library: &str,
) -> IndexMap<String, Vec<String>> {
    let display = |library: &str| {
        if library == default_library {
            WORK_LIBRARY_KEY.to_string()
        } else {
            library.to_string()
        }
    };

    let mut map: IndexMap<String, Vec<String>> = resolution
        .libraries
        .iter()
        .map(|lib| (display(lib), Vec::new()))
        .collect();

    for f in resolution.files.iter().filter(|f| !f.is_include) {
        map.entry(display(&f.source.library))
            .or_default()
            .push(f.source.relative.clone());
    }
    map
}

/// Write the project file as YAML, keys in declaration order.
pub fn write_project_yaml(path: &Path, project: &ProjectFile) -> Result<()> {
    let yaml = serde_yaml::to_string(project).context("failed to serialise project file")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Print a summary of the resolution run to stdout.
///
/// Diagnostics go to stderr so that stdout stays clean for downstream consumers.
pub fn print_summary(resolution: &Resolution, output: Option<&Path>) {
    let includes = resolution.files.iter().filter(|f| f.is_include).count();
    println!(
        "Resolved {} files ({} include) from {} indexed, {} design units",
        resolution.files.len(),
        includes,
        resolution.indexed_files,
        resolution.unit_count,
    );
    println!("  Libraries: {}", display_libraries(&resolution.libraries));
    println!(
        "  Graph: {} nodes, {} edges",
        resolution.graph.file_count(),
        resolution.graph.edge_count()
    );
    if let Some(path) = output {
        println!("  Wrote {}", path.display());
    }

    resolution.diagnostics.print();
    if !resolution.diagnostics.is_empty() {
        eprintln!(
            "  {} warning(s): {} unresolved, {} cycle(s)",
            resolution.diagnostics.len(),
            resolution.diagnostics.unresolved_count(),
            resolution.diagnostics.cycle_count(),
        );
    }
}

/// Print the per-library dictionary as pretty JSON.
pub fn print_library_sources(sources: &IndexMap<String, Vec<String>>) -> Result<()> {
    let json = serde_json::to_string_pretty(sources).context("failed to serialise libraries")?;
    println!("{json}");
    Ok(())
}

/// One `(library, unit)` key of the index, as listed by `index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    pub library: String,
    pub unit: String,
    pub files: Vec<String>,
    pub ambiguous: bool,
}

/// Flatten the unit index into sorted, printable entries.
pub fn index_entries(index: &UnitIndex) -> Vec<IndexEntry> {
    index
        .entries()
        .into_iter()
        .map(|(key, ids)| IndexEntry {
            library: if key.library.is_empty() {
                WORK_LIBRARY_KEY.to_string()
            } else {
                key.library.clone()
            },
            unit: key.name.clone(),
            files: ids.iter().map(|&id| index.file(id).relative.clone()).collect(),
            ambiguous: ids.len() > 1,
        })
        .collect()
}

/// Print the unit index as text or JSON.
pub fn print_index(index: &UnitIndex, json: bool) -> Result<()> {
    let entries = index_entries(index);
    if json {
        let out = serde_json::to_string_pretty(&entries).context("failed to serialise index")?;
        println!("{out}");
        return Ok(());
    }

    if index.files().is_empty() {
        println!("No HDL source files found.");
        return Ok(());
    }
    println!(
        "Indexed {} files, {} design units",
        index.files().len(),
        entries.len()
    );
    for entry in &entries {
        let marker = if entry.ambiguous { "  (ambiguous)" } else { "" };
        println!(
            "  {}.{} -> {}{marker}",
            entry.library,
            entry.unit,
            entry.files.join(", ")
        );
    }
    Ok(())
}

fn display_libraries(libraries: &[String]) -> String {
    libraries
        .iter()
        .map(|l| {
            if l.is_empty() {
                WORK_LIBRARY_KEY
            } else {
                l.as_str()
            }
        })
        .collect::<Vec<_>>()
        .join(" -> ")
}
