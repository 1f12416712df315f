//! Check command: report freshness without building.

use miette::Result;

use jargo_core::project::CheckKind;
use jargo_ops::ops_check;

use crate::cli::GlobalArgs;

pub fn exec(global: &GlobalArgs, jar: bool) -> Result<()> {
    let ctx = super::load_context(global, None)?;
    let kind = if jar {
        CheckKind::Packaged
    } else {
        CheckKind::Compiled
    };
    let report = ops_check::check_up_to_date(&ctx, kind)?;
    for (project, fresh) in &report.projects {
        let verdict = if *fresh { "up to date" } else { "stale" };
        println!("{project}: {verdict}");
    }
    Ok(())
}
