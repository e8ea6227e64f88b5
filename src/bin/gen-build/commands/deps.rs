//! `gen-build deps` command

use anyhow::{Context, Result};

use crate::cli::DepsArgs;
use gen_build::ops::generate_deps;

pub fn execute(args: DepsArgs) -> Result<()> {
    let (session, mut config) = super::prepare(&args.generate)?;
    if let Some(dir) = args.repository_dir {
        config.repository_dir = Some(dir);
    }

    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let output_dir = cwd.join(&args.deps_build_dir);

    let mode = super::write_mode(args.generate.check);
    let report = generate_deps(&session, &config, &output_dir, mode)?;
    super::finish(&report, mode)
}
