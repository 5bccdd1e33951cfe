use std::sync::Arc;

use crate::codegen::{encode_artifact, generate_programs, GeneratedNode, NodeProgram};
use crate::error::CompileError;
use crate::graph::{
    actual_output_ports, flatten_links, resolve_topology, validate_flat_graph, GraphIndex,
};
use crate::model::{FlowLink, FlowNode, FlowPort};
use crate::sandbox::JsSandbox;

/// Compilation result for one node: what gets written back to the store.
#[derive(Debug, Clone)]
pub struct CompiledNode {
    pub node_id: String,
    pub node_name: String,
    pub text: String,
    pub artifact: Vec<u8>,
}

/// Compiles a whole project: topology resolution, program generation, then
/// per-node artifact production. Nodes compile concurrently; the first
/// failure aborts the batch with the offending node's display name.
pub struct FlowCompiler {
    sandbox: Arc<JsSandbox>,
}

impl FlowCompiler {
    pub fn new(sandbox: Arc<JsSandbox>) -> Self {
        Self { sandbox }
    }

    pub async fn compile_project(
        &self,
        nodes: &[FlowNode],
        ports: &[FlowPort],
        links: &[FlowLink],
    ) -> Result<Vec<CompiledNode>, CompileError> {
        let index = GraphIndex::build(nodes, ports, links);

        let output_ports = actual_output_ports(ports, &index)?;
        let flat = flatten_links(links, &index)?;
        let topology = resolve_topology(flat, &index)?;
        validate_flat_graph(&topology, &index)?;

        let generated = generate_programs(&topology, &output_ports, &index)?;

        let jobs = generated.into_iter().map(|node| {
            let node_name = index.name_of(&node.node_id);
            let sandbox = self.sandbox.clone();
            async move { compile_node(sandbox, node, node_name).await }
        });

        futures::future::try_join_all(jobs).await
    }
}

async fn compile_node(
    sandbox: Arc<JsSandbox>,
    node: GeneratedNode,
    node_name: String,
) -> Result<CompiledNode, CompileError> {
    if let NodeProgram::Script(body) = &node.program {
        sandbox
            .validate(&body.source)
            .await
            .map_err(|e| CompileError::ScriptCompile {
                node_name: node_name.clone(),
                message: e.to_string(),
            })?;
    }

    if node.text.trim().is_empty() {
        return Err(CompileError::EmptyProgramText { node_name });
    }

    let artifact = encode_artifact(&node.program).map_err(|e| CompileError::ArtifactEncode {
        node_name: node_name.clone(),
        message: e.to_string(),
    })?;
    if artifact.is_empty() {
        return Err(CompileError::EmptyArtifact { node_name });
    }

    Ok(CompiledNode {
        node_id: node.node_id,
        node_name,
        text: node.text,
        artifact,
    })
}
