use miette::Result;

use jargo_ops::ops_classpath;

use crate::cli::GlobalArgs;

pub fn exec(global: &GlobalArgs, runtime: bool) -> Result<()> {
    let ctx = super::load_context(global, None)?;
    println!("{}", ops_classpath::classpath_string(&ctx, !runtime)?);
    Ok(())
}
