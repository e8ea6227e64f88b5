//! `gen-build ns-loader` command

use anyhow::Result;

use crate::cli::NsLoaderArgs;
use gen_build::ops::{generate_ns_loader, NsLoaderOptions};

pub fn execute(args: NsLoaderArgs) -> Result<()> {
    let opts = NsLoaderOptions {
        dirs: args.dirs,
        output: args.output,
        name: args.name,
        tests_only: args.tests_only,
    };

    let mode = super::write_mode(args.check);
    let report = generate_ns_loader(&opts, mode)?;
    super::finish(&report, mode)
}
