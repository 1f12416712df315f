use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all Jargo operations.
#[derive(Debug, Error, Diagnostic)]
pub enum JargoError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A project descriptor could not be read or is structurally invalid.
    #[error("Invalid project descriptor {path}: {message}")]
    #[diagnostic(help("Check the pom.xml for syntax errors"))]
    Descriptor { path: String, message: String },

    /// A required dependency could not be resolved to a project or file.
    #[error("Missing dependency {coordinate} (required by {dependent})")]
    #[diagnostic(help("Run `jargo fetch` or enable automatic downloads"))]
    MissingDependency {
        coordinate: String,
        dependent: String,
    },

    /// No configured repository yielded the artifact.
    #[error("Could not download {coordinate}: {message}")]
    DownloadFailure { coordinate: String, message: String },

    /// Unparsable version range or snapshot expression.
    #[error("Malformed version expression '{expression}': {message}")]
    MalformedVersion { expression: String, message: String },

    /// Malformed `${...}` syntax during property expansion.
    #[error("Invalid property expression '{input}': {message}")]
    PropertyExpansion { input: String, message: String },

    /// Dependency resolution failed for a structural reason (depth, cycles).
    #[error("Dependency resolution failed: {message}")]
    Resolution { message: String },

    /// The external compiler reported errors.
    #[error("Compilation of {project} failed: {message}")]
    Compilation { project: String, message: String },

    /// Network request failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type JargoResult<T> = miette::Result<T>;
