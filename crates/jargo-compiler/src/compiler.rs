//! The compiler seam: one invocation with sources, classpath and options.

use std::path::PathBuf;

/// A single compiler invocation.
#[derive(Debug, Clone, Default)]
pub struct CompileRequest {
    /// Java source files to compile.
    pub sources: Vec<PathBuf>,
    /// Output directory first, then dependency archives in resolver order.
    pub classpath: Vec<PathBuf>,
    pub source_version: Option<String>,
    pub target_version: Option<String>,
    /// Directory receiving `.class` files.
    pub output_dir: PathBuf,
}

/// The result of compiling a request.
#[derive(Debug)]
pub struct CompilationOutput {
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// A single compiler diagnostic message.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Note,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
            DiagnosticSeverity::Note => "note",
        };
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{file}:{line}: {prefix}: {}", self.message),
            (Some(file), None) => write!(f, "{file}: {prefix}: {}", self.message),
            _ => write!(f, "{prefix}: {}", self.message),
        }
    }
}

/// Implemented by each compiler backend.
pub trait Compiler: Send + Sync {
    /// Compile `request`. Diagnostics of a failed compilation are returned in
    /// the output; `Err` is reserved for failing to run the compiler at all.
    fn compile(&self, request: &CompileRequest) -> miette::Result<CompilationOutput>;
}

/// Join classpath entries with the platform separator.
pub fn to_classpath_string(entries: &[PathBuf]) -> String {
    let separator = if cfg!(windows) { ";" } else { ":" };
    entries
        .iter()
        .map(|p| p.to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join(separator)
}
