use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::StoreError;
use crate::model::{CompileResult, FlowLink, FlowNode, FlowPort, ProjectRecord};

use super::{CompiledNodeUpdate, ProjectStore};

#[derive(Default)]
struct MemoryState {
    projects: HashMap<i64, ProjectRecord>,
    nodes: HashMap<i64, Vec<FlowNode>>,
    ports: HashMap<i64, Vec<FlowPort>>,
    links: HashMap<i64, Vec<FlowLink>>,
}

/// In-memory [`ProjectStore`].
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a whole project graph in one call.
    pub fn seed_project(
        &self,
        project: ProjectRecord,
        nodes: Vec<FlowNode>,
        ports: Vec<FlowPort>,
        links: Vec<FlowLink>,
    ) {
        let mut state = self.state.write();
        let id = project.id;
        state.projects.insert(id, project);
        state.nodes.insert(id, nodes);
        state.ports.insert(id, ports);
        state.links.insert(id, links);
    }

    pub fn set_project_state(&self, project_id: i64, project_state: crate::model::ProjectState) {
        let mut state = self.state.write();
        if let Some(project) = state.projects.get_mut(&project_id) {
            project.state = project_state;
        }
    }

    /// Direct node replacement, used by tests to inject broken data.
    pub fn replace_nodes(&self, project_id: i64, nodes: Vec<FlowNode>) {
        self.state.write().nodes.insert(project_id, nodes);
    }

    pub fn compile_result(&self, project_id: i64) -> Option<CompileResult> {
        self.state
            .read()
            .projects
            .get(&project_id)
            .and_then(|p| p.props.compile_result.clone())
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn project_by_id(&self, project_id: i64) -> Result<Option<ProjectRecord>, StoreError> {
        Ok(self.state.read().projects.get(&project_id).cloned())
    }

    async fn project_by_context_path(
        &self,
        context_path: &str,
    ) -> Result<Option<ProjectRecord>, StoreError> {
        Ok(self
            .state
            .read()
            .projects
            .values()
            .find(|p| p.context_path == context_path)
            .cloned())
    }

    async fn nodes_by_project(&self, project_id: i64) -> Result<Vec<FlowNode>, StoreError> {
        Ok(self
            .state
            .read()
            .nodes
            .get(&project_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn ports_by_project(&self, project_id: i64) -> Result<Vec<FlowPort>, StoreError> {
        Ok(self
            .state
            .read()
            .ports
            .get(&project_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn links_by_project(&self, project_id: i64) -> Result<Vec<FlowLink>, StoreError> {
        Ok(self
            .state
            .read()
            .links
            .get(&project_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_compiled_nodes(
        &self,
        project_id: i64,
        updates: &[CompiledNodeUpdate],
    ) -> Result<(), StoreError> {
        let mut state = self.state.write();
        let nodes = state
            .nodes
            .get_mut(&project_id)
            .ok_or_else(|| StoreError::NotFound(format!("project {project_id}")))?;
        for update in updates {
            let node = nodes
                .iter_mut()
                .find(|n| n.id == update.node_id)
                .ok_or_else(|| StoreError::NotFound(format!("node {}", update.node_id)))?;
            node.script = Some(update.script.clone());
            node.artifact = Some(update.artifact.clone());
        }
        Ok(())
    }

    async fn bump_compile_version(
        &self,
        project_id: i64,
        expected: i64,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write();
        let project = state
            .projects
            .get_mut(&project_id)
            .ok_or_else(|| StoreError::NotFound(format!("project {project_id}")))?;
        if project.compile_version != expected {
            return Ok(false);
        }
        project.compile_version += 1;
        Ok(true)
    }

    async fn update_compile_result(
        &self,
        project_id: i64,
        result: &CompileResult,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write();
        let project = state
            .projects
            .get_mut(&project_id)
            .ok_or_else(|| StoreError::NotFound(format!("project {project_id}")))?;
        project.props.compile_result = Some(result.clone());
        Ok(())
    }
}
