use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn jargo_cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("jargo").unwrap();
    cmd.env("HOME", home).env_remove("RUST_LOG").arg("--offline");
    cmd
}

/// An aggregator with `core` and `app`, where `app` depends on `core`.
fn write_project(root: &Path) {
    fs::write(
        root.join("pom.xml"),
        r#"<project>
    <groupId>org.example</groupId>
    <artifactId>parent</artifactId>
    <version>1.0</version>
    <packaging>pom</packaging>
    <modules><module>core</module><module>app</module></modules>
</project>"#,
    )
    .unwrap();
    for (name, deps) in [
        ("core", ""),
        (
            "app",
            "<dependencies><dependency><groupId>org.example</groupId>\
             <artifactId>core</artifactId><version>1.0</version></dependency></dependencies>",
        ),
    ] {
        let dir = root.join(name);
        fs::create_dir_all(dir.join("src/main/java/org/example")).unwrap();
        fs::write(
            dir.join("pom.xml"),
            format!(
                r#"<project>
    <parent><groupId>org.example</groupId><artifactId>parent</artifactId><version>1.0</version></parent>
    <artifactId>{name}</artifactId>
    {deps}
</project>"#
            ),
        )
        .unwrap();
        fs::write(
            dir.join(format!("src/main/java/org/example/{name}.java")),
            "package org.example;",
        )
        .unwrap();
    }
}

#[test]
fn help_lists_commands() {
    let home = TempDir::new().unwrap();
    jargo_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("classpath"))
        .stdout(predicate::str::contains("deps"));
}

#[test]
fn missing_descriptor_fails() {
    let tmp = TempDir::new().unwrap();
    jargo_cmd(tmp.path())
        .current_dir(tmp.path())
        .arg("classpath")
        .assert()
        .failure()
        .stderr(predicate::str::contains("pom.xml"));
}

#[test]
fn include_sources_requires_jar() {
    let tmp = TempDir::new().unwrap();
    jargo_cmd(tmp.path())
        .args(["build", "--include-sources"])
        .assert()
        .failure();
}

#[test]
fn classpath_of_a_module() {
    let tmp = TempDir::new().unwrap();
    write_project(tmp.path());

    jargo_cmd(tmp.path())
        .current_dir(tmp.path().join("app/src/main/java"))
        .arg("classpath")
        .assert()
        .success()
        .stdout(predicate::str::contains("app/target/classes"))
        .stdout(predicate::str::contains("core/target/core-1.0.jar"));
}

#[test]
fn deps_lists_each_module() {
    let tmp = TempDir::new().unwrap();
    write_project(tmp.path());

    jargo_cmd(tmp.path())
        .current_dir(tmp.path())
        .arg("deps")
        .assert()
        .success()
        .stdout(predicate::str::contains("org.example:app:1.0"))
        .stdout(predicate::str::contains("  org.example:core:1.0 (compile)"));
}

#[test]
fn deps_rejects_unknown_scope() {
    let tmp = TempDir::new().unwrap();
    write_project(tmp.path());

    jargo_cmd(tmp.path())
        .current_dir(tmp.path())
        .args(["deps", "--exclude-scope", "test,bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bogus"));
}

#[test]
fn check_reports_unbuilt_modules_as_stale() {
    let tmp = TempDir::new().unwrap();
    write_project(tmp.path());

    jargo_cmd(tmp.path())
        .current_dir(tmp.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("org.example:core:1.0: stale"));
}

#[test]
fn clean_removes_module_output() {
    let tmp = TempDir::new().unwrap();
    write_project(tmp.path());
    let classes = tmp.path().join("core/target/classes");
    fs::create_dir_all(&classes).unwrap();
    fs::write(classes.join("core.class"), "fake").unwrap();

    jargo_cmd(tmp.path())
        .current_dir(tmp.path())
        .arg("clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 path(s)"));
    assert!(!classes.exists());

    jargo_cmd(tmp.path())
        .current_dir(tmp.path())
        .arg("clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to clean"));
}

#[test]
fn fetch_is_refused_offline() {
    let tmp = TempDir::new().unwrap();
    write_project(tmp.path());

    jargo_cmd(tmp.path())
        .current_dir(tmp.path())
        .arg("fetch")
        .assert()
        .failure()
        .stderr(predicate::str::contains("offline"));
}
