//! Persistence boundary.
//!
//! Graph CRUD and storage belong to an external collaborator; the engine
//! only consumes the [`ProjectStore`] trait. [`MemoryStore`] is the bundled
//! in-memory implementation used by tests and embedders.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{CompileResult, FlowLink, FlowNode, FlowPort, ProjectRecord};

/// Write-back of one compiled node.
#[derive(Debug, Clone)]
pub struct CompiledNodeUpdate {
    pub node_id: String,
    pub script: String,
    pub artifact: Vec<u8>,
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn project_by_id(&self, project_id: i64) -> Result<Option<ProjectRecord>, StoreError>;

    async fn project_by_context_path(
        &self,
        context_path: &str,
    ) -> Result<Option<ProjectRecord>, StoreError>;

    async fn nodes_by_project(&self, project_id: i64) -> Result<Vec<FlowNode>, StoreError>;

    async fn ports_by_project(&self, project_id: i64) -> Result<Vec<FlowPort>, StoreError>;

    async fn links_by_project(&self, project_id: i64) -> Result<Vec<FlowLink>, StoreError>;

    /// Persist generated text and artifact for a batch of nodes.
    async fn save_compiled_nodes(
        &self,
        project_id: i64,
        updates: &[CompiledNodeUpdate],
    ) -> Result<(), StoreError>;

    /// Conditionally increment the compile version: succeeds only when the
    /// stored version still equals `expected`. This is the optimistic lock
    /// protecting concurrent compiles of the same project.
    async fn bump_compile_version(
        &self,
        project_id: i64,
        expected: i64,
    ) -> Result<bool, StoreError>;

    /// Record the outcome of a compile request in the project's properties.
    async fn update_compile_result(
        &self,
        project_id: i64,
        result: &CompileResult,
    ) -> Result<(), StoreError>;
}
