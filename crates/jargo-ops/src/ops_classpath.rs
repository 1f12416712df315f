//! Operation: print the compile or runtime classpath.

use std::path::PathBuf;

use jargo_compiler::classpath::compute_classpath;
use jargo_compiler::compiler::to_classpath_string;

use crate::BuildContext;

/// Classpath entries of the context's project, output directory first.
pub fn classpath(ctx: &BuildContext, for_compile: bool) -> miette::Result<Vec<PathBuf>> {
    compute_classpath(&ctx.session, ctx.root, for_compile, ctx.download())
}

/// [`classpath`] joined with the platform path separator.
pub fn classpath_string(ctx: &BuildContext, for_compile: bool) -> miette::Result<String> {
    Ok(to_classpath_string(&classpath(ctx, for_compile)?))
}
