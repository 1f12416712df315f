//! Command dispatch and handler modules.

mod build;
mod check;
mod classpath;
mod clean;
mod deps;
mod fetch;

use std::path::PathBuf;

use miette::Result;

use jargo_core::config::{GlobalConfig, SessionConfig};
use jargo_ops::{BuildContext, DESCRIPTOR_FILE};
use jargo_util::errors::JargoError;
use jargo_util::fs::find_ancestor_with;

use crate::cli::{Cli, Command, GlobalArgs};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    let global = cli.global;
    match cli.command {
        Command::Build {
            jar,
            force,
            include_sources,
            jobs,
        } => build::exec(&global, jar, force, include_sources, jobs),
        Command::Clean => clean::exec(&global),
        Command::Check { jar } => check::exec(&global, jar),
        Command::Classpath { runtime } => classpath::exec(&global, runtime),
        Command::Deps {
            exclude_scope,
            optional,
        } => deps::exec(&global, exclude_scope, optional),
        Command::Fetch => fetch::exec(&global),
    }
}

/// Session configuration from `~/.jargo/config.toml` with command-line
/// flags applied on top.
fn session_config(global: &GlobalArgs, jobs: Option<usize>) -> Result<SessionConfig> {
    let mut config = SessionConfig::from_global(&GlobalConfig::load()?);
    config.verbose = global.verbose;
    config.debug = global.debug;
    if global.offline {
        config.offline = true;
    }
    if global.download {
        config.download_automatically = true;
    }
    if let Some(jobs) = jobs {
        config.jobs = jobs.max(1);
    }
    for define in &global.defines {
        let (key, value) = define.split_once('=').unwrap_or((define.as_str(), "true"));
        config
            .property_overrides
            .insert(key.trim().to_string(), value.to_string());
    }
    Ok(config)
}

fn project_dir(global: &GlobalArgs) -> Result<PathBuf> {
    if let Some(dir) = &global.project_dir {
        return Ok(dir.clone());
    }
    let cwd = std::env::current_dir().map_err(JargoError::Io)?;
    find_ancestor_with(&cwd, DESCRIPTOR_FILE).ok_or_else(|| {
        JargoError::Generic {
            message: format!(
                "could not find `{DESCRIPTOR_FILE}` in {} or any parent directory",
                cwd.display()
            ),
        }
        .into()
    })
}

/// Load the project the command operates on.
fn load_context(global: &GlobalArgs, jobs: Option<usize>) -> Result<BuildContext> {
    let dir = project_dir(global)?;
    tracing::debug!("project directory {}", dir.display());
    BuildContext::load(&dir, session_config(global, jobs)?)
}
