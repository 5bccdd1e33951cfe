use std::collections::HashMap;
use std::sync::Arc;

use crate::breaker::{provision_breakers, BreakerRegistry};
use crate::codegen::decode_artifact;
use crate::compiler::ExecFlowCache;
use crate::error::ResolveError;
use crate::graph::{flatten_links, resolve_topology, validate_flat_graph, GraphIndex};
use crate::mapping::provision_mappings;
use crate::model::{ProjectRecord, ProjectState};
use crate::runtime::{ExecContext, ExecFlow};
use crate::store::ProjectStore;

/// Resolves a context path to an executable flow.
///
/// Fast path: a fresh cache entry whose compile version matches the store's
/// authoritative version. Slow path: reload the graph, decode artifacts,
/// re-derive breaker and mapping maps, overwrite the cache entry.
pub struct FlowResolver {
    store: Arc<dyn ProjectStore>,
    cache: Arc<ExecFlowCache>,
    breakers: Arc<BreakerRegistry>,
}

impl FlowResolver {
    pub fn new(
        store: Arc<dyn ProjectStore>,
        cache: Arc<ExecFlowCache>,
        breakers: Arc<BreakerRegistry>,
    ) -> Self {
        Self {
            store,
            cache,
            breakers,
        }
    }

    pub async fn resolve(&self, context_path: &str) -> Result<Arc<ExecFlow>, ResolveError> {
        let project = self
            .store
            .project_by_context_path(context_path)
            .await?
            .ok_or_else(|| {
                tracing::error!(context_path, "no project bound to context path");
                ResolveError::ProjectNotFound(context_path.to_string())
            })?;

        if project.state == ProjectState::Offline {
            tracing::error!(context_path, "project is offline");
            return Err(ResolveError::ProjectOffline(context_path.to_string()));
        }

        if let Some(cached) = self.cache.get(context_path) {
            if cached.compile_version == project.compile_version {
                return Ok(cached);
            }
            tracing::debug!(
                context_path,
                cached = cached.compile_version,
                stored = project.compile_version,
                "compile version mismatch, rebuilding flow"
            );
        }

        self.rebuild(project).await
    }

    async fn rebuild(&self, project: ProjectRecord) -> Result<Arc<ExecFlow>, ResolveError> {
        let links = self.store.links_by_project(project.id).await?;
        let ports = self.store.ports_by_project(project.id).await?;
        let nodes = self.store.nodes_by_project(project.id).await?;

        let index = GraphIndex::build(&nodes, &ports, &links);
        let flat = flatten_links(&links, &index)?;
        let topology = resolve_topology(flat, &index)?;
        validate_flat_graph(&topology, &index)?;

        let mut programs = HashMap::with_capacity(topology.valid_node_ids.len());
        let mut node_names = HashMap::with_capacity(topology.valid_node_ids.len());
        for node_id in &topology.valid_node_ids {
            let node = index
                .nodes
                .get(node_id.as_str())
                .filter(|n| n.is_atomic())
                .ok_or_else(|| {
                    tracing::error!(node_id = %node_id, project_id = project.id, "cannot find node");
                    ResolveError::Consistency(crate::error::ConsistencyError::NodeNotFound(
                        node_id.clone(),
                    ))
                })?;
            let node_name = node.display_name().to_string();

            let artifact = node
                .artifact
                .as_deref()
                .filter(|bytes| !bytes.is_empty())
                .ok_or_else(|| {
                    tracing::error!(node_id = %node_id, project_id = project.id, "node has no artifact");
                    ResolveError::MissingArtifact {
                        project_name: project.name.clone(),
                        node_name: node_name.clone(),
                    }
                })?;

            let program = decode_artifact(artifact).map_err(|e| {
                tracing::error!(
                    node_id,
                    project_id = project.id,
                    error = %e,
                    "cannot load node program metadata"
                );
                ResolveError::ArtifactDecode {
                    project_name: project.name.clone(),
                    node_name: node_name.clone(),
                    message: e.to_string(),
                }
            })?;

            programs.insert(node_id.clone(), Arc::new(program));
            node_names.insert(node_id.clone(), node_name);
        }

        let breakers = provision_breakers(&index, &ports, &self.breakers)?;
        let mappings = provision_mappings(&index, &ports)?;

        let flow = Arc::new(ExecFlow {
            project_id: project.id,
            project_name: project.name,
            compile_version: project.compile_version,
            context_path: project.context_path.clone(),
            method: project.method,
            topology,
            programs,
            node_names,
            breakers,
            mappings,
            ctx: Arc::new(ExecContext::new()),
        });

        self.cache.put(&project.context_path, flow.clone());
        Ok(flow)
    }
}
