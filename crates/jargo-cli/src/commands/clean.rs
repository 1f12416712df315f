use miette::Result;

use jargo_ops::ops_clean::{self, CleanResult};

use crate::cli::GlobalArgs;

pub fn exec(global: &GlobalArgs) -> Result<()> {
    let ctx = super::load_context(global, None)?;
    match ops_clean::clean(&ctx)? {
        CleanResult::Cleaned(paths) => {
            for path in &paths {
                tracing::info!("removed {}", path.display());
            }
            println!("Removed {} path(s)", paths.len());
        }
        CleanResult::NothingToClean => println!("Nothing to clean"),
    }
    Ok(())
}
