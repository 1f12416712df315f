use jargo_util::errors::JargoError;

#[test]
fn test_io_error_display() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err = JargoError::from(io_err);
    assert!(err.to_string().contains("I/O error"), "got: {err}");
}

#[test]
fn test_missing_dependency_names_both_coordinates() {
    let err = JargoError::MissingDependency {
        coordinate: "org.example:lib:1.0".to_string(),
        dependent: "org.example:app:2.0".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Missing dependency org.example:lib:1.0 (required by org.example:app:2.0)"
    );
}

#[test]
fn test_download_failure_display() {
    let err = JargoError::DownloadFailure {
        coordinate: "g:a:1".to_string(),
        message: "no repository had it".to_string(),
    };
    assert_eq!(err.to_string(), "Could not download g:a:1: no repository had it");
}

#[test]
fn test_malformed_version_display() {
    let err = JargoError::MalformedVersion {
        expression: "[1.0".to_string(),
        message: "unterminated range".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Malformed version expression '[1.0': unterminated range"
    );
}

#[test]
fn test_property_expansion_display() {
    let err = JargoError::PropertyExpansion {
        input: "${oops".to_string(),
        message: "missing '}'".to_string(),
    };
    assert!(err.to_string().contains("${oops"));
}

#[test]
fn test_compilation_error_display() {
    let err = JargoError::Compilation {
        project: "core".to_string(),
        message: "javac failed".to_string(),
    };
    assert_eq!(err.to_string(), "Compilation of core failed: javac failed");
}

#[test]
fn test_generic_error_display() {
    let err = JargoError::Generic {
        message: "something broke".to_string(),
    };
    assert_eq!(err.to_string(), "something broke");
}
