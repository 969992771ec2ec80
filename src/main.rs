mod cli;
mod config;
mod diagnostics;
mod export;
mod graph;
mod index;
mod language;
mod library;
mod order;
mod output;
mod parser;
mod paths;
mod resolver;
mod walker;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Commands, ProjectArgs};
use config::HdlOrderConfig;
use diagnostics::Diagnostics;
use language::DialectMap;
use resolver::{ResolveOptions, index_project, resolve_project};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let working_root = std::env::current_dir().context("cannot determine working directory")?;
    let config = HdlOrderConfig::load(&working_root);

    match cli.command {
        Commands::Resolve {
            toplevel,
            project,
            project_name,
            output,
            vhdl_std,
            libraries,
            json,
        } => {
            let mut diagnostics = Diagnostics::new();
            let options =
                build_options(toplevel, &project, &config, &working_root, &mut diagnostics);
            let mut resolution = resolve_project(&options)?;
            diagnostics.extend(std::mem::take(&mut resolution.diagnostics));
            resolution.diagnostics = diagnostics;

            let vhdl_std = vhdl_std.or(config.vhdl_std).unwrap_or_default();
            let name = project_name.unwrap_or_else(|| file_stem(&options.top_level));
            let project_file = output::project_file(&resolution, &name, vhdl_std);
            let sources = output::library_sources(&resolution, &options.default_library);

            if json {
                let report = output::ResolveReport {
                    project: &project_file,
                    libraries: &sources,
                    library_order: &resolution.libraries,
                    diagnostics: &resolution.diagnostics,
                    indexed_files: resolution.indexed_files,
                    unit_count: resolution.unit_count,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
                resolution.diagnostics.print();
                return Ok(());
            }

            let output_path = working_root.join(&output);
            output::write_project_yaml(&output_path, &project_file)?;
            output::print_summary(&resolution, Some(&output));
            if libraries {
                output::print_library_sources(&sources)?;
            }
        }

        Commands::Index { project, json } => {
            let mut diagnostics = Diagnostics::new();
            let options = build_options(
                PathBuf::new(),
                &project,
                &config,
                &working_root,
                &mut diagnostics,
            );
            let index = index_project(&options, &mut diagnostics)?;
            output::print_index(&index, json)?;
            diagnostics.print();
        }

        Commands::Graph { toplevel, project } => {
            let mut diagnostics = Diagnostics::new();
            let options =
                build_options(toplevel, &project, &config, &working_root, &mut diagnostics);
            let resolution = resolve_project(&options)?;
            print!("{}", export::render_dot(&resolution.graph));
            diagnostics.print();
            resolution.diagnostics.print();
        }
    }

    Ok(())
}

/// Merge command-line arguments over `hdl-order.toml`.
fn build_options(
    top_level: PathBuf,
    args: &ProjectArgs,
    config: &HdlOrderConfig,
    working_root: &Path,
    diagnostics: &mut Diagnostics,
) -> ResolveOptions {
    let mut libraries = config.library_map();
    libraries.add_cli_rules(&args.lib_map, diagnostics);

    if args.verbose && !libraries.is_empty() {
        eprintln!("Applying library mappings:");
        for (library, prefix) in libraries.rules() {
            eprintln!("    - '{library}' -> '{prefix}'");
        }
    }

    let search_roots = if args.search_paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        args.search_paths.clone()
    };

    ResolveOptions {
        top_level,
        search_roots,
        working_root: working_root.to_path_buf(),
        default_library: args
            .library
            .clone()
            .or_else(|| config.default_library.clone())
            .unwrap_or_default(),
        libraries,
        dialects: DialectMap::with_overrides(&config.extensions),
        external_libraries: config.external_libraries(),
        exclude: config.exclude.clone().unwrap_or_default(),
        verbose: args.verbose,
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}
