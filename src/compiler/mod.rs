//! Batch compilation of a project's nodes and the compiled-flow cache.

mod cache;
#[allow(clippy::module_inception)]
mod compiler;

pub use cache::{CacheStats, ExecFlowCache, FlowCacheConfig};
pub use compiler::{CompiledNode, FlowCompiler};
