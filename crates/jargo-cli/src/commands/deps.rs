//! Deps command: print resolved dependencies per project.

use miette::Result;

use jargo_ops::ops_deps::{self, DepsOptions};

use crate::cli::GlobalArgs;

pub fn exec(global: &GlobalArgs, exclude_scopes: Vec<String>, optional: bool) -> Result<()> {
    let ctx = super::load_context(global, None)?;
    let opts = DepsOptions {
        exclude_scopes,
        include_optionals: optional,
    };
    let report = ops_deps::list_dependencies(&ctx, &opts)?;
    for listing in &report.listings {
        println!("{}", listing.project);
        for line in &listing.lines {
            println!("  {line}");
        }
    }
    if !report.conflicts.is_empty() {
        eprint!("{}", report.conflicts);
    }
    Ok(())
}
