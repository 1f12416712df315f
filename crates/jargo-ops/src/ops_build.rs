//! Operation: build a project and the source-built projects it depends on.
//!
//! [`build`] walks stale dependencies depth-first on the calling thread.
//! [`build_parallel`] schedules the same work over a bounded worker pool:
//! a project starts once every planned project it depends on has finished,
//! and the first failure stops further admissions.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

use jargo_compiler::artifact::{Manifest, PackageRequest};
use jargo_compiler::classpath::{compute_classpath, manifest_class_path};
use jargo_compiler::compiler::{CompileRequest, DiagnosticSeverity};
use jargo_compiler::plan::BuildPlan;
use jargo_compiler::sources::{copy_resources, scan_sources};
use jargo_compiler::staleness::StalenessEngine;
use jargo_core::project::{CheckKind, NodeId, ProjectNode};
use jargo_resolver::{ResolveFilter, Session};
use jargo_util::errors::JargoError;
use jargo_util::progress::{status, status_info};

use crate::BuildContext;

const SOURCE_PROPERTY: &str = "maven.compiler.source";
const TARGET_PROPERTY: &str = "maven.compiler.target";

/// Options for a build invocation.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Package the archive after compiling.
    pub make_artifact: bool,
    /// Build even when the up-to-date check passes, recompiling every source.
    pub force: bool,
    /// Add the descriptor and source trees to the archive.
    pub include_sources: bool,
}

impl BuildOptions {
    fn check_kind(&self) -> CheckKind {
        if self.make_artifact {
            CheckKind::Packaged
        } else {
            CheckKind::Compiled
        }
    }

    /// Dependencies are packaged like the project but never forced.
    fn for_dependency(&self) -> Self {
        Self {
            make_artifact: self.make_artifact,
            force: false,
            include_sources: false,
        }
    }
}

/// What a build did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Projects built in this call, in completion order.
    pub built: Vec<String>,
    /// Projects skipped because they were up to date.
    pub fresh: Vec<String>,
}

/// Build the context's project on the calling thread.
pub fn build(ctx: &BuildContext, opts: &BuildOptions) -> miette::Result<BuildSummary> {
    let start = Instant::now();
    let mut run = SequentialBuild {
        ctx,
        engine: StalenessEngine::new(&ctx.session, ctx.download()),
        in_progress: HashSet::new(),
        summary: BuildSummary::default(),
    };
    run.build_node(ctx.root, opts)?;
    finish(&run.summary, start);
    Ok(run.summary)
}

struct SequentialBuild<'a> {
    ctx: &'a BuildContext,
    engine: StalenessEngine<'a>,
    in_progress: HashSet<NodeId>,
    summary: BuildSummary,
}

impl SequentialBuild<'_> {
    /// Returns whether `id` was built by this call.
    fn build_node(&mut self, id: NodeId, opts: &BuildOptions) -> miette::Result<bool> {
        let node = self.ctx.session.node(id);
        if node.packaging == "pom" && node.build_from_source {
            let mut built = false;
            for child in node.children() {
                built |= self.build_node(child, opts)?;
            }
            return Ok(built);
        }
        if !opts.force && self.engine.is_fresh(id, opts.check_kind())? {
            if node.build_from_source {
                status_info("Fresh", &node.to_string());
                self.summary.fresh.push(node.to_string());
            }
            return Ok(false);
        }
        if !node.build_from_source || node.is_built() || !self.in_progress.insert(id) {
            return Ok(false);
        }
        let result = self.build_stale(&node, opts);
        self.in_progress.remove(&id);
        result
    }

    fn build_stale(&mut self, node: &ProjectNode, opts: &BuildOptions) -> miette::Result<bool> {
        let ctx = self.ctx;
        let session = &ctx.session;
        let filter = ResolveFilter::build(ctx.download());
        let dep_opts = opts.for_dependency();
        let mut full_rebuild = opts.force;

        for dep in session.resolve(node.id, &filter)?.nodes() {
            if dep == node.id || self.engine.is_fresh(dep, opts.check_kind())? {
                continue;
            }
            tracing::debug!("{node} needs {} rebuilt first", session.node(dep));
            self.build_node(dep, &dep_opts)?;
            full_rebuild = true;
        }

        build_project(ctx, node.id, opts, full_rebuild)?;
        self.summary.built.push(node.to_string());
        Ok(true)
    }
}

/// Build the context's project with up to `jobs` projects in flight.
pub fn build_parallel(ctx: Arc<BuildContext>, opts: &BuildOptions) -> miette::Result<BuildSummary> {
    let runtime = tokio::runtime::Runtime::new().map_err(JargoError::Io)?;
    runtime.block_on(run_pool(ctx, opts.clone()))
}

async fn run_pool(ctx: Arc<BuildContext>, opts: BuildOptions) -> miette::Result<BuildSummary> {
    let start = Instant::now();
    let download = ctx.download();
    let kind = opts.check_kind();
    let roots = ctx.buildable_modules(ctx.root);
    let plan = BuildPlan::new(&ctx.session, &roots, download)?;
    tracing::debug!("build plan has {} project(s)", plan.len());

    // Verdicts are taken before anything is rebuilt.
    let engine = StalenessEngine::new(&ctx.session, download);
    let mut stale: HashSet<NodeId> = HashSet::new();
    for &id in plan.order() {
        let forced = opts.force && roots.contains(&id);
        if forced || !engine.is_fresh(id, kind)? {
            stale.insert(id);
        }
    }

    let mut waiting: HashMap<NodeId, usize> = plan
        .order()
        .iter()
        .map(|&id| (id, plan.dependencies(id).len()))
        .collect();
    let mut ready: VecDeque<NodeId> = plan
        .order()
        .iter()
        .copied()
        .filter(|&id| waiting.get(&id) == Some(&0))
        .collect();

    let semaphore = Arc::new(Semaphore::new(ctx.session.config().jobs.max(1)));
    // A task hands its permit back through its result, so a slot only frees
    // up once this loop has seen how the task ended.
    let mut join_set: JoinSet<(NodeId, miette::Result<()>, OwnedSemaphorePermit)> =
        JoinSet::new();
    let mut summary = BuildSummary::default();
    let mut failure: Option<miette::Report> = None;

    loop {
        while failure.is_none() {
            let Some(&id) = ready.front() else {
                break;
            };
            let node = ctx.session.node(id);
            if !stale.contains(&id) || node.is_built() {
                ready.pop_front();
                if !stale.contains(&id) {
                    status_info("Fresh", &node.to_string());
                    summary.fresh.push(node.to_string());
                }
                release(&plan, id, &mut waiting, &mut ready);
                continue;
            }
            let Ok(permit) = Arc::clone(&semaphore).try_acquire_owned() else {
                break;
            };
            ready.pop_front();

            let is_root = roots.contains(&id);
            let node_opts = if is_root {
                opts.clone()
            } else {
                opts.for_dependency()
            };
            let full_rebuild = (opts.force && is_root)
                || plan.dependencies(id).iter().any(|dep| stale.contains(dep));

            let task_ctx = Arc::clone(&ctx);
            let name = node.to_string();
            join_set.spawn(async move {
                let result = tokio::task::spawn_blocking(move || {
                    build_project(&task_ctx, id, &node_opts, full_rebuild)
                })
                .await
                .unwrap_or_else(|e| {
                    Err(JargoError::Generic {
                        message: format!("build of {name} did not complete: {e}"),
                    }
                    .into())
                });
                (id, result, permit)
            });
        }

        let Some(joined) = join_set.join_next().await else {
            break;
        };
        match joined {
            Ok((id, Ok(()), _permit)) => {
                summary.built.push(ctx.session.node(id).to_string());
                release(&plan, id, &mut waiting, &mut ready);
            }
            Ok((id, Err(e), _permit)) => {
                tracing::debug!("build of {} failed; draining", ctx.session.node(id));
                failure.get_or_insert(e);
            }
            Err(e) => {
                failure.get_or_insert_with(|| {
                    JargoError::Generic {
                        message: format!("build task failed: {e}"),
                    }
                    .into()
                });
            }
        }
    }

    if let Some(e) = failure {
        return Err(e);
    }
    finish(&summary, start);
    Ok(summary)
}

/// Mark `id` complete and queue each dependent whose last wait it was.
fn release(
    plan: &BuildPlan,
    id: NodeId,
    waiting: &mut HashMap<NodeId, usize>,
    ready: &mut VecDeque<NodeId>,
) {
    for dependent in plan.dependents(id) {
        if let Some(count) = waiting.get_mut(&dependent) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                ready.push_back(dependent);
            }
        }
    }
}

fn finish(summary: &BuildSummary, start: Instant) {
    status(
        "Finished",
        &format!(
            "{} project(s) built, {} fresh in {:.2}s",
            summary.built.len(),
            summary.fresh.len(),
            start.elapsed().as_secs_f64()
        ),
    );
}

/// Compile one project, copy its resources, embed its descriptor and,
/// when asked, package it. Dependencies must already be built.
fn build_project(
    ctx: &BuildContext,
    id: NodeId,
    opts: &BuildOptions,
    full_rebuild: bool,
) -> miette::Result<()> {
    let session = &ctx.session;
    let node = session.node(id);
    if node.is_aggregator() {
        tracing::debug!("{node} has neither sources nor resources");
        node.mark_built();
        return Ok(());
    }
    let download = ctx.download();
    jargo_util::fs::ensure_dir(&node.output_dir).map_err(JargoError::Io)?;

    let scan = scan_sources(&node.source_directory(), &node.output_dir);
    let sources = if full_rebuild { scan.all } else { scan.stale };
    if !sources.is_empty() {
        let (source_version, target_version) = language_levels(session, id)?;
        status(
            "Compiling",
            &format!(
                "{node} ({} file{})",
                sources.len(),
                if sources.len() == 1 { "" } else { "s" }
            ),
        );
        let request = CompileRequest {
            sources,
            classpath: compute_classpath(session, id, true, download)?,
            source_version,
            target_version,
            output_dir: node.output_dir.clone(),
        };
        let output = ctx.compiler.compile(&request)?;
        for diagnostic in &output.diagnostics {
            eprintln!("{diagnostic}");
        }
        if !output.success {
            let errors: Vec<String> = output
                .diagnostics
                .iter()
                .filter(|d| d.severity == DiagnosticSeverity::Error)
                .map(ToString::to_string)
                .collect();
            return Err(JargoError::Compilation {
                project: node.coordinate.gav(),
                message: if errors.is_empty() {
                    "compiler reported failure".to_string()
                } else {
                    format!("{} error(s), first: {}", errors.len(), errors[0])
                },
            }
            .into());
        }
    }

    let copied = copy_resources(&node.resource_directories(), &node.output_dir)?;
    if copied > 0 {
        tracing::info!("copied {copied} resource(s) for {node}");
    }
    embed_descriptor(&node)?;

    if opts.make_artifact && node.is_jar() {
        package(ctx, &node, opts.include_sources)?;
    }
    node.mark_built();
    Ok(())
}

/// `source` and `target` levels from the nearest ancestor declaring them,
/// falling back to the `maven.compiler.*` properties.
fn language_levels(
    session: &Session,
    id: NodeId,
) -> miette::Result<(Option<String>, Option<String>)> {
    let mut source = None;
    let mut target = None;
    for ancestor in session.ancestry(id) {
        if source.is_none() {
            if let Some(value) = ancestor.build.source.as_deref() {
                source = session.expand(ancestor.id, value)?;
            }
        }
        if target.is_none() {
            if let Some(value) = ancestor.build.target.as_deref() {
                target = session.expand(ancestor.id, value)?;
            }
        }
    }
    if source.is_none() {
        source = level_property(session, id, SOURCE_PROPERTY)?;
    }
    if target.is_none() {
        target = level_property(session, id, TARGET_PROPERTY)?;
    }
    Ok((source, target))
}

fn level_property(session: &Session, id: NodeId, name: &str) -> miette::Result<Option<String>> {
    match session.get_property(id, name) {
        Some(value) => session.expand(id, &value),
        None => Ok(None),
    }
}

/// Copy the project's `pom.xml` to `META-INF/maven/<group>/<artifact>/`.
fn embed_descriptor(node: &ProjectNode) -> miette::Result<()> {
    let Some(descriptor) = node.descriptor_path.as_deref().filter(|p| p.is_file()) else {
        return Ok(());
    };
    let dest = node
        .output_dir
        .join("META-INF")
        .join("maven")
        .join(node.coordinate.group_id.as_deref().unwrap_or_default())
        .join(&node.coordinate.artifact_id)
        .join("pom.xml");
    let current = jargo_util::fs::mtime(&dest);
    if current.is_some() && current >= jargo_util::fs::mtime(descriptor) {
        return Ok(());
    }
    jargo_util::fs::copy_file(descriptor, &dest).map_err(JargoError::Io)?;
    Ok(())
}

fn package(ctx: &BuildContext, node: &ProjectNode, include_sources: bool) -> miette::Result<PathBuf> {
    let session = &ctx.session;
    let mut manifest = Manifest::new();
    manifest.set(
        Manifest::CREATED_BY,
        concat!("jargo ", env!("CARGO_PKG_VERSION")),
    );
    if let Some(main_class) = node.build.main_class.as_deref() {
        if let Some(main_class) = session.expand(node.id, main_class)? {
            manifest.set(Manifest::MAIN_CLASS, main_class);
        }
    }
    if let Some(class_path) = manifest_class_path(session, node.id, ctx.download())? {
        manifest.set(Manifest::CLASS_PATH, class_path);
    }

    let mut extra_entries = Vec::new();
    if include_sources {
        if let Some(descriptor) = node.descriptor_path.clone() {
            extra_entries.push(("pom.xml".to_string(), descriptor));
        }
        extra_entries.push(("src/main/java/".to_string(), node.source_directory()));
        for dir in node.resource_directories() {
            extra_entries.push(("src/main/resources/".to_string(), dir));
        }
    }

    status("Packaging", &node.target.display().to_string());
    ctx.writer.package(&PackageRequest {
        output_dir: node.output_dir.clone(),
        manifest,
        extra_entries,
        destination: node.target.clone(),
    })
}
