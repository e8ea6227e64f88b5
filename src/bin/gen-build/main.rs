//! gen-build CLI - Bazel BUILD files for Clojure projects

use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use gen_build::core::manifest::ConfigValidationError;
use gen_build::resolver::ResolutionError;
use gen_build::util::diagnostic::emit;

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && io::stderr().is_terminal();

    if let Err(e) = run(cli) {
        report(&e, color);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("gen_build=debug")
    } else {
        EnvFilter::new("gen_build=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(!cli.no_color)
        .with_target(false)
        .without_time()
        .init();

    // Execute command
    match cli.command {
        Commands::Deps(args) => commands::deps::execute(args),
        Commands::Srcs(args) => commands::srcs::execute(args),
        Commands::NsLoader(args) => commands::ns_loader::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Print a fatal error, with diagnostics for the errors that carry them.
fn report(err: &anyhow::Error, color: bool) {
    if let Some(e) = err.chain().find_map(|c| c.downcast_ref::<ResolutionError>()) {
        emit(&e.to_diagnostic(), color);
        return;
    }
    if let Some(e) = err.chain().find_map(|c| c.downcast_ref::<ConfigValidationError>()) {
        eprintln!("error: {:?}", miette::Report::new(e.clone()));
        return;
    }
    eprintln!("error: {:#}", err);
}
