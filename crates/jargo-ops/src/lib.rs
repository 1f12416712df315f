pub mod ops_build;
pub mod ops_check;
pub mod ops_classpath;
pub mod ops_clean;
pub mod ops_deps;
pub mod ops_fetch;

use std::path::Path;
use std::sync::Arc;

use jargo_compiler::artifact::ArtifactWriter;
use jargo_compiler::compiler::Compiler;
use jargo_compiler::jar::JarWriter;
use jargo_compiler::javac::JavacCompiler;
use jargo_core::config::SessionConfig;
use jargo_core::descriptor::DescriptorSource;
use jargo_core::project::NodeId;
use jargo_maven::download::{HttpFetcher, RepositoryFetcher};
use jargo_maven::pom::PomDescriptorSource;
use jargo_resolver::Session;
use jargo_util::errors::JargoError;

/// Name of the descriptor file that marks a project directory.
pub const DESCRIPTOR_FILE: &str = "pom.xml";

/// Everything an operation needs: the resolution session, the project it was
/// started in, and the compiler and archive writer to build with.
pub struct BuildContext {
    pub session: Session,
    pub root: NodeId,
    pub compiler: Arc<dyn Compiler>,
    pub writer: Arc<dyn ArtifactWriter>,
}

impl BuildContext {
    /// Load the project in `project_dir` with `javac` and the jar writer.
    ///
    /// The HTTP transport is only created when the session may go online.
    pub fn load(project_dir: &Path, config: SessionConfig) -> miette::Result<Self> {
        let descriptors: Arc<dyn DescriptorSource> =
            Arc::new(PomDescriptorSource::new(config.property_overrides.clone()));
        let fetcher: Option<Arc<dyn RepositoryFetcher>> = if config.offline {
            None
        } else {
            Some(Arc::new(HttpFetcher::new()?))
        };
        let session = Session::new(config, descriptors, fetcher);
        Self::with_session(
            session,
            project_dir,
            Arc::new(JavacCompiler::from_env()),
            Arc::new(JarWriter),
        )
    }

    /// Load the project in `project_dir` into an existing session.
    pub fn with_session(
        session: Session,
        project_dir: &Path,
        compiler: Arc<dyn Compiler>,
        writer: Arc<dyn ArtifactWriter>,
    ) -> miette::Result<Self> {
        if !project_dir.join(DESCRIPTOR_FILE).is_file() {
            return Err(JargoError::Generic {
                message: format!(
                    "could not find `{DESCRIPTOR_FILE}` in {}",
                    project_dir.display()
                ),
            }
            .into());
        }
        let root = session.load_project(project_dir)?;
        Ok(Self {
            session,
            root,
            compiler,
            writer,
        })
    }

    /// Whether operations may fetch missing artifacts.
    pub fn download(&self) -> bool {
        self.session
            .config()
            .may_download(self.session.config().download_automatically)
    }

    /// Source-built projects below `id` that produce output, descending
    /// through `pom`-packaged aggregators.
    pub fn buildable_modules(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            let node = self.session.node(id);
            if node.packaging == "pom" {
                let mut children = node.children();
                children.reverse();
                pending.extend(children);
            } else if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }
}
