//! `javac` invocation and diagnostic parsing.

use std::path::PathBuf;

use jargo_util::errors::JargoError;
use jargo_util::process::CommandBuilder;

use crate::compiler::{
    to_classpath_string, CompilationOutput, CompileRequest, Compiler, Diagnostic,
    DiagnosticSeverity,
};

/// Compiler backend running the JDK's `javac`.
pub struct JavacCompiler {
    binary: PathBuf,
    extra_args: Vec<String>,
}

impl JavacCompiler {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            extra_args: Vec::new(),
        }
    }

    /// `javac` from `JAVA_HOME` if set, else from `PATH`.
    pub fn from_env() -> Self {
        match std::env::var_os("JAVA_HOME") {
            Some(home) => Self::new(PathBuf::from(home).join("bin").join("javac")),
            None => Self::new("javac"),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Command-line arguments for `request`, without the program name.
    pub fn arguments(&self, request: &CompileRequest) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(source) = &request.source_version {
            args.push("-source".to_string());
            args.push(source.clone());
        }
        if let Some(target) = &request.target_version {
            args.push("-target".to_string());
            args.push(target.clone());
        }
        args.push("-classpath".to_string());
        args.push(to_classpath_string(&request.classpath));
        args.push("-d".to_string());
        args.push(request.output_dir.to_string_lossy().to_string());
        args.extend(self.extra_args.iter().cloned());
        args.extend(request.sources.iter().map(|s| s.to_string_lossy().to_string()));
        args
    }
}

impl Compiler for JavacCompiler {
    fn compile(&self, request: &CompileRequest) -> miette::Result<CompilationOutput> {
        if request.sources.is_empty() {
            return Ok(CompilationOutput {
                success: true,
                diagnostics: vec![],
            });
        }
        std::fs::create_dir_all(&request.output_dir).map_err(JargoError::Io)?;

        let output = CommandBuilder::new(self.binary.to_string_lossy().to_string())
            .args(self.arguments(request))
            .exec()
            .map_err(|e| JargoError::Generic {
                message: format!("Failed to execute javac: {e}"),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut diagnostics = parse_diagnostics(&format!("{stdout}\n{stderr}"));

        if !output.status.success() && diagnostics.is_empty() {
            let raw = format!("{stdout}\n{stderr}").trim().to_string();
            if !raw.is_empty() {
                diagnostics.push(Diagnostic {
                    severity: DiagnosticSeverity::Error,
                    message: raw,
                    file: None,
                    line: None,
                });
            }
        }

        Ok(CompilationOutput {
            success: output.status.success(),
            diagnostics,
        })
    }
}

/// Parse `File.java:12: error: message` lines.
pub fn parse_diagnostics(output: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for line in output.lines() {
        let trimmed = line.trim();
        for (marker, severity) in [
            (": error: ", DiagnosticSeverity::Error),
            (": warning: ", DiagnosticSeverity::Warning),
            (": note: ", DiagnosticSeverity::Note),
        ] {
            if let Some((location, message)) = trimmed.split_once(marker) {
                diagnostics.push(located(location, message, severity));
                break;
            }
        }
    }
    diagnostics
}

fn located(location: &str, message: &str, severity: DiagnosticSeverity) -> Diagnostic {
    // "path/File.java:12"; the path itself may contain ':' on Windows.
    let (file, line) = match location.rsplit_once(':') {
        Some((file, line)) => match line.parse::<u32>() {
            Ok(n) => (Some(file.to_string()), Some(n)),
            Err(_) => (Some(location.to_string()), None),
        },
        None => (Some(location.to_string()), None),
    };
    Diagnostic {
        severity,
        message: message.trim().to_string(),
        file,
        line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_in_javac_order() {
        let javac = JavacCompiler::new("javac");
        let request = CompileRequest {
            sources: vec![PathBuf::from("src/A.java")],
            classpath: vec![PathBuf::from("target/classes"), PathBuf::from("dep.jar")],
            source_version: Some("1.8".into()),
            target_version: None,
            output_dir: PathBuf::from("target/classes"),
        };
        let args = javac.arguments(&request);
        assert_eq!(args[0..2], ["-source", "1.8"]);
        assert!(!args.contains(&"-target".to_string()));
        let cp = args.iter().position(|a| a == "-classpath").unwrap();
        assert!(args[cp + 1].starts_with("target/classes"));
        assert_eq!(args.last().unwrap(), "src/A.java");
    }

    #[test]
    fn parses_located_diagnostics() {
        let out = "src/A.java:3: error: cannot find symbol\n  symbol: class B\n\
                   src/A.java:9: warning: [deprecation] old\n1 error\n";
        let diags = parse_diagnostics(out);
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].severity, DiagnosticSeverity::Error);
        assert_eq!(diags[0].file.as_deref(), Some("src/A.java"));
        assert_eq!(diags[0].line, Some(3));
        assert_eq!(diags[0].message, "cannot find symbol");
        assert_eq!(diags[1].severity, DiagnosticSeverity::Warning);
        assert_eq!(diags[0].to_string(), "src/A.java:3: error: cannot find symbol");
    }

    #[test]
    fn no_sources_is_a_noop() {
        let javac = JavacCompiler::new("/definitely/not/javac");
        let out = javac.compile(&CompileRequest::default()).unwrap();
        assert!(out.success);
    }
}
