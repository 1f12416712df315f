//! Dependency resolution engine: the resolution session, project-tree
//! loading, property and version resolution, the dependency-management
//! query, and the depth-first nearest-wins resolver.

pub mod conflict;
pub mod expand;
pub mod loader;
pub mod lookup;
pub mod management;
pub mod resolver;
pub mod session;

pub use resolver::{ResolveFilter, ResolvedEntry, ResolvedSet};
pub use session::Session;
