//! Build command implementation.

use std::sync::Arc;

use miette::Result;

use jargo_ops::ops_build::{self, BuildOptions};

use crate::cli::GlobalArgs;

pub fn exec(
    global: &GlobalArgs,
    jar: bool,
    force: bool,
    include_sources: bool,
    jobs: Option<usize>,
) -> Result<()> {
    let ctx = super::load_context(global, jobs)?;
    let opts = BuildOptions {
        make_artifact: jar,
        force,
        include_sources,
    };
    if ctx.session.config().jobs > 1 {
        ops_build::build_parallel(Arc::new(ctx), &opts)?;
    } else {
        ops_build::build(&ctx, &opts)?;
    }
    Ok(())
}
