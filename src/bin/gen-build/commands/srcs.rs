//! `gen-build srcs` command

use anyhow::Result;

use crate::cli::SrcsArgs;
use gen_build::ops::generate_srcs;

pub fn execute(args: SrcsArgs) -> Result<()> {
    let (session, config) = super::prepare(&args.generate)?;

    let mode = super::write_mode(args.generate.check);
    let report = generate_srcs(&session, &config, mode)?;
    super::finish(&report, mode)
}
