//! CLI argument definitions for Jargo.
//!
//! Uses `clap` derive macros to define the command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "jargo",
    version,
    about = "A Cargo-style build tool for Maven-layout Java projects",
    long_about = "Jargo resolves, compiles and packages Java projects described by pom.xml \
                  files, rebuilding only what is out of date."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug diagnostics
    #[arg(long, global = true)]
    pub debug: bool,

    /// Never contact remote repositories
    #[arg(long, global = true)]
    pub offline: bool,

    /// Download missing artifacts from remote repositories
    #[arg(long, global = true)]
    pub download: bool,

    /// Project directory (defaults to the nearest directory with a pom.xml)
    #[arg(short = 'C', long = "project-dir", global = true, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// Override a property, e.g. `-D java.version=17`
    #[arg(short = 'D', long = "define", global = true, value_name = "KEY=VALUE")]
    pub defines: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile the project and the projects it depends on
    Build {
        /// Package a jar after compiling
        #[arg(long)]
        jar: bool,
        /// Build even if up to date, recompiling every source
        #[arg(long)]
        force: bool,
        /// Add pom.xml and the source trees to the jar
        #[arg(long, requires = "jar")]
        include_sources: bool,
        /// Number of projects to build in parallel
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Remove the output of the project and its source-built dependencies
    Clean,

    /// Report whether the project is up to date
    Check {
        /// Check the packaged jar rather than the classes
        #[arg(long)]
        jar: bool,
    },

    /// Print the compile classpath
    Classpath {
        /// Print the runtime classpath instead
        #[arg(long)]
        runtime: bool,
    },

    /// List resolved dependencies and version conflicts
    Deps {
        /// Scopes to leave out (comma separated)
        #[arg(long, value_delimiter = ',', value_name = "SCOPE")]
        exclude_scope: Vec<String>,
        /// Include optional dependencies
        #[arg(long)]
        optional: bool,
    },

    /// Download all dependencies into the local repository
    Fetch,
}

pub fn parse() -> Cli {
    Cli::parse()
}
