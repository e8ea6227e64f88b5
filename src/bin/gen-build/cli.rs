//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use gen_build::core::RepoTag;

/// gen-build - Bazel BUILD files for Clojure projects
#[derive(Parser)]
#[command(name = "gen-build")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the BUILD file of the dependency repository
    Deps(DepsArgs),

    /// Generate a BUILD file in every source directory
    Srcs(SrcsArgs),

    /// Generate a module that requires every module under some directories
    NsLoader(NsLoaderArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options shared by `deps` and `srcs`.
#[derive(Args)]
pub struct GenerateArgs {
    /// Path to deps.toml (searched upward from the current directory by default)
    #[arg(long, env = "GEN_BUILD_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Aliases to merge in, comma separated
    #[arg(short = 'A', long, value_delimiter = ',')]
    pub aliases: Vec<String>,

    /// Resolved basis file (defaults to basis.json next to the manifest)
    #[arg(long, env = "GEN_BUILD_BASIS")]
    pub basis: Option<PathBuf>,

    /// Repository tag holding library targets, e.g. @deps
    #[arg(long)]
    pub deps_repo_tag: Option<RepoTag>,

    /// Name of generated files
    #[arg(long)]
    pub build_file_name: Option<String>,

    /// Check every target before rendering
    #[arg(long)]
    pub validate: bool,

    /// Write nothing; fail if any generated file is out of date
    #[arg(long)]
    pub check: bool,
}

#[derive(Args)]
pub struct DepsArgs {
    #[command(flatten)]
    pub generate: GenerateArgs,

    /// Directory to write the repository BUILD file into
    #[arg(long)]
    pub deps_build_dir: PathBuf,

    /// Archive paths under this directory are written relative to it
    /// (defaults to --deps-build-dir)
    #[arg(long)]
    pub repository_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct SrcsArgs {
    #[command(flatten)]
    pub generate: GenerateArgs,
}

#[derive(Args)]
pub struct NsLoaderArgs {
    /// Directory to scan (repeatable)
    #[arg(long = "dir", required = true)]
    pub dirs: Vec<PathBuf>,

    /// File to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// Name of the generated module
    #[arg(long)]
    pub name: String,

    /// Only collect modules from test files
    #[arg(long)]
    pub tests_only: bool,

    /// Write nothing; fail if the output file is out of date
    #[arg(long)]
    pub check: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
