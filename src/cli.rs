use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::language::VhdlStandard;

/// Compile-order resolver for VHDL, Verilog and SystemVerilog source trees.
///
/// hdl-order discovers which files define which design units, follows the
/// references from a top-level file and emits a dependency-respecting order of
/// files and logical libraries (as a TerosHDL project file by default).
#[derive(Parser, Debug)]
#[command(
    name = "hdl-order",
    version,
    about,
    long_about = None,
    propagate_version = true,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that indexes a source tree.
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Root directory to search for HDL files (repeatable; default: current directory).
    #[arg(short = 's', long = "search-path")]
    pub search_paths: Vec<PathBuf>,

    /// Default logical library for source files ("" corresponds to "work").
    #[arg(long)]
    pub library: Option<String>,

    /// Map directories to libraries. Format: 'lib_name:path/to/dir'.
    /// Example: --lib-map common:src/common vendor:ip/vendor
    #[arg(long = "lib-map", num_args = 1..)]
    pub lib_map: Vec<String>,

    /// Print discovered files and resolution progress to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve the compile order from a top-level file and write a TerosHDL project file.
    Resolve {
        /// The top-level HDL file of the project (e.g. tb_top.vhd).
        toplevel: PathBuf,

        #[command(flatten)]
        project: ProjectArgs,

        /// Name of the project. Defaults to the top-level file name.
        #[arg(short = 'p', long)]
        project_name: Option<String>,

        /// Name of the output YAML file.
        #[arg(short, long, default_value = "teros-project.yml")]
        output: PathBuf,

        /// VHDL standard used for file_type.
        #[arg(long, value_enum)]
        vhdl_std: Option<VhdlStandard>,

        /// Also print the library -> files dictionary (JSON) to stdout.
        #[arg(long)]
        libraries: bool,

        /// Print a JSON report to stdout instead of writing the YAML file.
        #[arg(long)]
        json: bool,
    },

    /// Index the source tree and list every design unit with its defining file(s).
    Index {
        #[command(flatten)]
        project: ProjectArgs,

        /// Output results as JSON instead of human-readable text.
        #[arg(long)]
        json: bool,
    },

    /// Resolve from a top-level file and print the file dependency graph as Graphviz DOT.
    Graph {
        /// The top-level HDL file of the project.
        toplevel: PathBuf,

        #[command(flatten)]
        project: ProjectArgs,
    },
}
