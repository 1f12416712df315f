use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use jargo_compiler::compiler::{
    CompilationOutput, CompileRequest, Compiler, Diagnostic, DiagnosticSeverity,
};
use jargo_compiler::jar::JarWriter;
use jargo_core::config::SessionConfig;
use jargo_core::project::CheckKind;
use jargo_maven::pom::PomDescriptorSource;
use jargo_ops::ops_build::{build, build_parallel, BuildOptions};
use jargo_ops::ops_check::check_up_to_date;
use jargo_ops::ops_classpath::classpath;
use jargo_ops::ops_clean::{clean, CleanResult};
use jargo_ops::ops_deps::{list_dependencies, DepsOptions};
use jargo_ops::BuildContext;
use jargo_resolver::Session;

/// Writes one class file per source and records every invocation.
/// Sources containing `BROKEN` fail to compile.
#[derive(Default)]
struct FakeCompiler {
    calls: Mutex<Vec<(String, usize)>>,
}

impl FakeCompiler {
    fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }

    fn projects(&self) -> Vec<String> {
        self.calls().into_iter().map(|(p, _)| p).collect()
    }
}

impl Compiler for FakeCompiler {
    fn compile(&self, request: &CompileRequest) -> miette::Result<CompilationOutput> {
        let project = request
            .output_dir
            .parent()
            .and_then(Path::parent)
            .and_then(Path::file_name)
            .unwrap()
            .to_string_lossy()
            .to_string();
        self.calls
            .lock()
            .unwrap()
            .push((project, request.sources.len()));

        let mut diagnostics = Vec::new();
        for source in &request.sources {
            let text = fs::read_to_string(source).unwrap();
            if text.contains("BROKEN") {
                diagnostics.push(Diagnostic {
                    severity: DiagnosticSeverity::Error,
                    message: "cannot find symbol".to_string(),
                    file: Some(source.display().to_string()),
                    line: Some(1),
                });
                continue;
            }
            let relative = source
                .to_string_lossy()
                .split("src/main/java/")
                .nth(1)
                .unwrap()
                .to_string();
            let class = request.output_dir.join(relative).with_extension("class");
            fs::create_dir_all(class.parent().unwrap()).unwrap();
            fs::write(class, b"cafebabe").unwrap();
        }
        Ok(CompilationOutput {
            success: diagnostics.is_empty(),
            diagnostics,
        })
    }
}

fn set_age(path: &Path, age_secs: i64) {
    let now = SystemTime::now();
    let time = if age_secs >= 0 {
        now - Duration::from_secs(age_secs as u64)
    } else {
        now + Duration::from_secs((-age_secs) as u64)
    };
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

fn write_old(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
    set_age(path, 100);
}

fn module_pom(artifact: &str, deps: &[&str], main_class: Option<&str>) -> String {
    let deps: String = deps
        .iter()
        .map(|d| {
            format!(
                "<dependency><groupId>g</groupId><artifactId>{d}</artifactId><version>1.0</version></dependency>"
            )
        })
        .collect();
    let build = main_class
        .map(|main| {
            format!(
                r#"<build><plugins><plugin>
                    <artifactId>maven-jar-plugin</artifactId>
                    <configuration><archive><manifest><mainClass>{main}</mainClass></manifest></archive></configuration>
                </plugin></plugins></build>"#
            )
        })
        .unwrap_or_default();
    format!(
        r#"<project>
    <parent><groupId>g</groupId><artifactId>root</artifactId><version>1.0</version></parent>
    <artifactId>{artifact}</artifactId>
    <dependencies>{deps}</dependencies>
    {build}
</project>"#
    )
}

/// An aggregator `root` with modules, each holding one source file.
struct Workspace {
    _tmp: tempfile::TempDir,
    root: PathBuf,
}

impl Workspace {
    /// `modules` are `(name, comma-separated dependencies, source text)`.
    fn new(modules: &[(&str, &str, &str)]) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        let names: String = modules
            .iter()
            .map(|(name, _, _)| format!("<module>{name}</module>"))
            .collect();
        write_old(
            &root.join("pom.xml"),
            &format!(
                r#"<project>
    <groupId>g</groupId><artifactId>root</artifactId><version>1.0</version>
    <packaging>pom</packaging>
    <modules>{names}</modules>
</project>"#
            ),
        );
        for (name, deps, source) in modules {
            let main = (*name == "app").then_some("p.App");
            let deps: Vec<&str> = deps.split(',').filter(|d| !d.is_empty()).collect();
            write_old(&root.join(name).join("pom.xml"), &module_pom(name, &deps, main));
            let class = format!("{}{}", name[..1].to_uppercase(), &name[1..]);
            write_old(
                &root.join(format!("{name}/src/main/java/p/{class}.java")),
                source,
            );
        }
        Self { _tmp: tmp, root }
    }

    fn context(&self, dir: &str, compiler: Arc<FakeCompiler>, jobs: usize) -> BuildContext {
        let config = SessionConfig {
            offline: true,
            jobs,
            local_repository: self.root.join("repository"),
            repositories: Vec::new(),
            ..SessionConfig::default()
        };
        let session = Session::new(
            config,
            Arc::new(PomDescriptorSource::new(Default::default())),
            None,
        );
        BuildContext::with_session(session, &self.root.join(dir), compiler, Arc::new(JarWriter))
            .unwrap()
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

fn two_modules() -> Workspace {
    Workspace::new(&[
        ("leaf", "", "class Leaf {}"),
        ("app", "leaf", "class App {}"),
    ])
}

#[test]
fn build_compiles_dependencies_first() {
    let ws = two_modules();
    let compiler = Arc::new(FakeCompiler::default());
    let ctx = ws.context("app", compiler.clone(), 1);

    let summary = build(&ctx, &BuildOptions::default()).unwrap();

    assert_eq!(compiler.projects(), vec!["leaf", "app"]);
    assert_eq!(summary.built, vec!["g:leaf:1.0", "g:app:1.0"]);
    assert!(ws.path("app/target/classes/p/App.class").is_file());
    assert!(ws.path("leaf/target/classes/p/Leaf.class").is_file());
}

#[test]
fn second_build_in_a_session_does_no_work() {
    let ws = two_modules();
    let compiler = Arc::new(FakeCompiler::default());
    let ctx = ws.context("app", compiler.clone(), 1);

    build(&ctx, &BuildOptions::default()).unwrap();
    let calls = compiler.calls().len();
    let summary = build(&ctx, &BuildOptions::default()).unwrap();

    assert_eq!(compiler.calls().len(), calls);
    assert!(summary.built.is_empty());
}

#[test]
fn up_to_date_project_is_reported_fresh_by_a_new_session() {
    let ws = two_modules();
    let compiler = Arc::new(FakeCompiler::default());
    build(&ws.context("app", compiler.clone(), 1), &BuildOptions::default()).unwrap();

    let ctx = ws.context("app", compiler.clone(), 1);
    assert!(check_up_to_date(&ctx, CheckKind::Compiled).unwrap().is_fresh());
    let summary = build(&ctx, &BuildOptions::default()).unwrap();
    assert_eq!(summary.fresh, vec!["g:app:1.0"]);
    assert_eq!(compiler.calls().len(), 2);
}

#[test]
fn rebuilt_dependency_forces_full_recompilation() {
    let ws = Workspace::new(&[
        ("leaf", "", "class Leaf {}"),
        ("app", "leaf", "class App {}"),
    ]);
    write_old(&ws.path("app/src/main/java/p/Util.java"), "class Util {}");
    let compiler = Arc::new(FakeCompiler::default());
    build(&ws.context("app", compiler.clone(), 1), &BuildOptions::default()).unwrap();

    set_age(&ws.path("leaf/src/main/java/p/Leaf.java"), -10);
    let compiler = Arc::new(FakeCompiler::default());
    let ctx = ws.context("app", compiler.clone(), 1);
    assert!(!check_up_to_date(&ctx, CheckKind::Compiled).unwrap().is_fresh());
    build(&ctx, &BuildOptions::default()).unwrap();

    // Both app sources are recompiled although their classes were current.
    assert_eq!(
        compiler.calls(),
        vec![("leaf".to_string(), 1), ("app".to_string(), 2)]
    );
}

#[test]
fn incremental_build_passes_only_stale_sources() {
    let ws = Workspace::new(&[("leaf", "", "class Leaf {}")]);
    write_old(&ws.path("leaf/src/main/java/p/Other.java"), "class Other {}");
    build(
        &ws.context("leaf", Arc::new(FakeCompiler::default()), 1),
        &BuildOptions::default(),
    )
    .unwrap();

    set_age(&ws.path("leaf/src/main/java/p/Other.java"), -10);
    let compiler = Arc::new(FakeCompiler::default());
    build(&ws.context("leaf", compiler.clone(), 1), &BuildOptions::default()).unwrap();
    assert_eq!(compiler.calls(), vec![("leaf".to_string(), 1)]);
}

#[test]
fn aggregator_builds_every_module() {
    let ws = Workspace::new(&[
        ("leaf", "", "class Leaf {}"),
        ("app", "leaf", "class App {}"),
        ("other", "", "class Other {}"),
    ]);
    let compiler = Arc::new(FakeCompiler::default());
    let ctx = ws.context(".", compiler.clone(), 1);

    build(&ctx, &BuildOptions::default()).unwrap();

    let mut projects = compiler.projects();
    projects.sort();
    assert_eq!(projects, vec!["app", "leaf", "other"]);
}

#[test]
fn resources_and_descriptor_are_copied_to_the_output() {
    let ws = two_modules();
    write_old(&ws.path("app/src/main/resources/app.properties"), "k=v");
    let ctx = ws.context("app", Arc::new(FakeCompiler::default()), 1);

    build(&ctx, &BuildOptions::default()).unwrap();

    assert_eq!(
        fs::read_to_string(ws.path("app/target/classes/app.properties")).unwrap(),
        "k=v"
    );
    assert!(ws
        .path("app/target/classes/META-INF/maven/g/app/pom.xml")
        .is_file());
}

#[test]
fn packaging_writes_manifest_and_sources() {
    let ws = two_modules();
    let ctx = ws.context("app", Arc::new(FakeCompiler::default()), 1);
    let opts = BuildOptions {
        make_artifact: true,
        include_sources: true,
        ..Default::default()
    };

    build(&ctx, &opts).unwrap();

    let jar = ws.path("app/target/app-1.0.jar");
    let mut archive = zip::ZipArchive::new(fs::File::open(&jar).unwrap()).unwrap();
    let mut manifest = String::new();
    archive
        .by_name("META-INF/MANIFEST.MF")
        .unwrap()
        .read_to_string(&mut manifest)
        .unwrap();
    assert!(manifest.starts_with("Manifest-Version: 1.0\r\n"));
    assert!(manifest.contains("Main-Class: p.App\r\n"));
    assert!(manifest.contains("Class-Path: leaf-1.0.jar\r\n"));
    for name in [
        "p/App.class",
        "META-INF/maven/g/app/pom.xml",
        "pom.xml",
        "src/main/java/p/App.java",
    ] {
        assert!(archive.by_name(name).is_ok(), "missing {name}");
    }

    // The dependency was packaged too, without sources.
    let leaf = ws.path("leaf/target/leaf-1.0.jar");
    let mut archive = zip::ZipArchive::new(fs::File::open(&leaf).unwrap()).unwrap();
    assert!(archive.by_name("p/Leaf.class").is_ok());
    assert!(archive.by_name("src/main/java/p/Leaf.java").is_err());

    let ctx = ws.context("app", Arc::new(FakeCompiler::default()), 1);
    assert!(check_up_to_date(&ctx, CheckKind::Packaged).unwrap().is_fresh());
}

#[test]
fn compile_failure_names_the_project() {
    let ws = Workspace::new(&[("leaf", "", "class Leaf { BROKEN }")]);
    let ctx = ws.context("leaf", Arc::new(FakeCompiler::default()), 1);

    let err = build(&ctx, &BuildOptions::default()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("g:leaf:1.0"), "{message}");
    assert!(message.contains("cannot find symbol"), "{message}");
}

#[test]
fn pooled_build_respects_dependency_order() {
    let ws = Workspace::new(&[
        ("leaf", "", "class Leaf {}"),
        ("mid", "leaf", "class Mid {}"),
        ("app", "mid", "class App {}"),
        ("other", "", "class Other {}"),
    ]);
    let compiler = Arc::new(FakeCompiler::default());
    let ctx = Arc::new(ws.context(".", compiler.clone(), 4));

    let summary = build_parallel(ctx, &BuildOptions::default()).unwrap();

    assert_eq!(summary.built.len(), 4);
    let projects = compiler.projects();
    let position = |name: &str| projects.iter().position(|p| p == name).unwrap();
    assert!(position("leaf") < position("mid"));
    assert!(position("mid") < position("app"));
}

#[test]
fn pooled_build_stops_at_the_first_failure() {
    let ws = Workspace::new(&[
        ("leaf", "", "class Leaf { BROKEN }"),
        ("app", "leaf", "class App {}"),
    ]);
    let compiler = Arc::new(FakeCompiler::default());
    let ctx = Arc::new(ws.context(".", compiler.clone(), 2));

    let err = build_parallel(ctx, &BuildOptions::default()).unwrap_err();

    assert!(err.to_string().contains("g:leaf:1.0"));
    assert_eq!(compiler.projects(), vec!["leaf"]);
}

#[test]
fn pooled_build_admits_nothing_after_a_sibling_fails() {
    let ws = Workspace::new(&[
        ("alpha", "", "class Alpha { BROKEN }"),
        ("beta", "", "class Beta { BROKEN }"),
        ("gamma", "", "class Gamma { BROKEN }"),
    ]);
    let compiler = Arc::new(FakeCompiler::default());
    let ctx = Arc::new(ws.context(".", compiler.clone(), 1));

    assert!(build_parallel(ctx, &BuildOptions::default()).is_err());
    assert_eq!(compiler.calls().len(), 1);
}

#[test]
fn pooled_build_only_finishes_tasks_already_running() {
    let ws = Workspace::new(&[
        ("alpha", "", "class Alpha { BROKEN }"),
        ("beta", "", "class Beta { BROKEN }"),
        ("gamma", "", "class Gamma { BROKEN }"),
        ("delta", "", "class Delta { BROKEN }"),
        ("eps", "", "class Eps { BROKEN }"),
    ]);
    let compiler = Arc::new(FakeCompiler::default());
    let ctx = Arc::new(ws.context(".", compiler.clone(), 2));

    assert!(build_parallel(ctx, &BuildOptions::default()).is_err());
    assert!(compiler.calls().len() <= 2);
}

#[test]
fn pooled_build_skips_fresh_projects() {
    let ws = two_modules();
    build(
        &ws.context(".", Arc::new(FakeCompiler::default()), 1),
        &BuildOptions::default(),
    )
    .unwrap();

    let compiler = Arc::new(FakeCompiler::default());
    let summary =
        build_parallel(Arc::new(ws.context(".", compiler.clone(), 2)), &BuildOptions::default())
            .unwrap();
    assert!(compiler.calls().is_empty());
    assert_eq!(summary.fresh.len(), 2);
}

#[test]
fn clean_removes_output_of_project_and_dependencies() {
    let ws = two_modules();
    let opts = BuildOptions {
        make_artifact: true,
        ..Default::default()
    };
    build(&ws.context("app", Arc::new(FakeCompiler::default()), 1), &opts).unwrap();
    assert!(ws.path("leaf/target/leaf-1.0.jar").is_file());

    let ctx = ws.context("app", Arc::new(FakeCompiler::default()), 1);
    let CleanResult::Cleaned(removed) = clean(&ctx).unwrap() else {
        panic!("expected output to be removed");
    };
    assert_eq!(removed.len(), 4);
    assert!(!ws.path("app/target/classes").exists());
    assert!(!ws.path("leaf/target/leaf-1.0.jar").exists());

    assert_eq!(clean(&ctx).unwrap(), CleanResult::NothingToClean);
}

#[test]
fn compile_classpath_lists_output_then_dependencies() {
    let ws = two_modules();
    let ctx = ws.context("app", Arc::new(FakeCompiler::default()), 1);
    let entries = classpath(&ctx, true).unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].ends_with("app/target/classes"));
    assert!(entries[1].ends_with("leaf/target/leaf-1.0.jar"));
}

#[test]
fn dependency_listing_per_module() {
    let ws = two_modules();
    let ctx = ws.context(".", Arc::new(FakeCompiler::default()), 1);
    let report = list_dependencies(&ctx, &DepsOptions::default()).unwrap();

    let app = report
        .listings
        .iter()
        .find(|l| l.project == "g:app:1.0")
        .unwrap();
    assert_eq!(app.lines, vec!["g:leaf:1.0 (compile)"]);
    assert!(report.conflicts.is_empty());
}

#[test]
fn unknown_scope_is_rejected() {
    let ws = two_modules();
    let ctx = ws.context("app", Arc::new(FakeCompiler::default()), 1);
    let opts = DepsOptions {
        exclude_scopes: vec!["bogus".to_string()],
        ..Default::default()
    };
    assert!(list_dependencies(&ctx, &opts).is_err());
}
