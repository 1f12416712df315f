use miette::Result;

use jargo_ops::ops_fetch;

use crate::cli::GlobalArgs;

pub fn exec(global: &GlobalArgs) -> Result<()> {
    let ctx = super::load_context(global, None)?;
    ops_fetch::fetch_dependencies(&ctx)?;
    Ok(())
}
