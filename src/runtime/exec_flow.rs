use std::collections::HashMap;
use std::sync::Arc;

use crate::breaker::CircuitBreaker;
use crate::codegen::NodeProgram;
use crate::error::RuntimeError;
use crate::graph::FlowTopology;
use crate::mapping::MappingRuntime;
use crate::model::HttpMethod;

use super::context::ExecContext;

/// The execution-ready bundle for one project: everything a request needs,
/// immutable and shared behind `Arc` across concurrent requests.
pub struct ExecFlow {
    pub project_id: i64,
    pub project_name: String,
    pub compile_version: i64,
    pub context_path: String,
    pub method: HttpMethod,
    pub topology: FlowTopology,
    /// Decoded artifact per valid node.
    pub programs: HashMap<String, Arc<NodeProgram>>,
    pub node_names: HashMap<String, String>,
    /// HTTP nodes only.
    pub breakers: HashMap<String, Arc<CircuitBreaker>>,
    /// DATA_MAPPING nodes only.
    pub mappings: HashMap<String, Arc<MappingRuntime>>,
    /// Shared by all runs of this compiled flow.
    pub ctx: Arc<ExecContext>,
}

impl std::fmt::Debug for ExecFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecFlow")
            .field("project_id", &self.project_id)
            .field("project_name", &self.project_name)
            .field("compile_version", &self.compile_version)
            .field("context_path", &self.context_path)
            .field("method", &self.method)
            .field("topology", &self.topology)
            .field("node_names", &self.node_names)
            .finish_non_exhaustive()
    }
}

impl ExecFlow {
    pub fn node_name(&self, node_id: &str) -> String {
        self.node_names
            .get(node_id)
            .cloned()
            .unwrap_or_else(|| node_id.to_string())
    }

    /// The request's method must match the one the project was bound to.
    pub fn validate_method(&self, actual: HttpMethod) -> Result<(), RuntimeError> {
        if self.method != actual {
            return Err(RuntimeError::MethodMismatch {
                expected: self.method.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(())
    }
}
