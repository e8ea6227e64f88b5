//! Command implementations

pub mod completions;
pub mod deps;
pub mod ns_loader;
pub mod srcs;

use anyhow::{anyhow, Context, Result};

use crate::cli::GenerateArgs;
use gen_build::builder::GenConfig;
use gen_build::core::find_manifest;
use gen_build::ops::{load_session, Session, SessionOptions, WriteMode, WriteReport};
use gen_build::util::config::project_config_path;
use gen_build::util::diagnostic::suggestions;
use gen_build::util::Config;

/// Load the session and the generation settings: defaults, then the
/// project config, then command-line flags.
fn prepare(args: &GenerateArgs) -> Result<(Session, GenConfig)> {
    let manifest_path = match &args.manifest {
        Some(path) => path.clone(),
        None => {
            let cwd = std::env::current_dir().context("failed to read current directory")?;
            find_manifest(&cwd)
                .map_err(|e| anyhow!("{}\n{}", e, suggestions::NO_MANIFEST))?
        }
    };

    let session = load_session(&SessionOptions {
        manifest_path,
        aliases: args.aliases.clone(),
        basis_path: args.basis.clone(),
    })?;

    let config = Config::load_or_default(&project_config_path(session.manifest_dir()));
    let mut settings = GenConfig::from_config(&config)?;
    if let Some(tag) = &args.deps_repo_tag {
        settings.deps_repo = tag.clone();
    }
    if let Some(name) = &args.build_file_name {
        settings.build_file_name = name.clone();
    }
    if args.validate {
        settings.validate = true;
    }

    Ok((session, settings))
}

fn write_mode(check: bool) -> WriteMode {
    if check {
        WriteMode::Check
    } else {
        WriteMode::Write
    }
}

/// Print a summary, failing in check mode when anything is stale.
fn finish(report: &WriteReport, mode: WriteMode) -> Result<()> {
    report.ensure_fresh()?;
    match mode {
        WriteMode::Check => eprintln!("{} file(s) up to date", report.total()),
        WriteMode::Write => eprintln!(
            "{} file(s) written, {} unchanged",
            report.written.len(),
            report.unchanged.len()
        ),
    }
    Ok(())
}
