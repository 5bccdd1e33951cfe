use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::RuntimeError;
use crate::model::HttpMethod;
use crate::sandbox::JsSandbox;

use super::exec_flow::ExecFlow;
use super::http::HttpCaller;
use super::task::{FlowTask, RuntimeDeps};
use super::is_system_header;

/// Maximum number of node-to-node transitions in one walk. Cycles are
/// rejected at compile time; this is the runtime backstop against graphs
/// that evaded it.
pub const MAX_HOPS: usize = 256;

/// One inbound request as the engine sees it.
#[derive(Debug, Clone, Default)]
pub struct FlowRequest {
    pub method: HttpMethod,
    pub body: Option<String>,
    pub headers: HashMap<String, String>,
    pub params: HashMap<String, String>,
}

/// The terminal node's output.
#[derive(Debug, Clone)]
pub struct FlowResponse {
    pub body: Option<String>,
    pub headers: HashMap<String, String>,
}

/// Walks a compiled flow for one request at a time. The executor itself is
/// stateless and shared; every call builds a fresh set of task instances.
pub struct FlowExecutor {
    deps: RuntimeDeps,
}

impl FlowExecutor {
    pub fn new(sandbox: Arc<JsSandbox>, http: Arc<HttpCaller>) -> Self {
        Self {
            deps: RuntimeDeps { sandbox, http },
        }
    }

    pub async fn execute(
        &self,
        flow: &ExecFlow,
        request: FlowRequest,
    ) -> Result<FlowResponse, RuntimeError> {
        flow.validate_method(request.method)?;

        if flow.topology.valid_node_ids.is_empty() || flow.topology.links.is_empty() {
            return Err(RuntimeError::EmptyFlow);
        }

        let headers = lowercase_keys(&request.headers);
        let system_headers: HashMap<String, String> = headers
            .iter()
            .filter(|(name, _)| is_system_header(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let mut tasks = self.instantiate_tasks(flow, &request, &headers)?;

        // End nodes must present as leaves regardless of stray metadata.
        for end_id in &flow.topology.end_node_ids {
            if let Some(task) = tasks.get_mut(end_id) {
                task.children.clear();
            }
        }

        let start_id = flow.topology.start_node_id.clone();
        if let Some(start) = tasks.get_mut(&start_id) {
            start.input_request_body = request.body.clone();
            start.input_response_body = None;
        }

        let mut current_id = start_id;
        let mut hops = 0usize;
        loop {
            hops += 1;
            if hops > MAX_HOPS {
                tracing::error!(
                    project = %flow.project_name,
                    path = hops,
                    "task path overflow, aborting walk"
                );
                return Err(RuntimeError::HopLimitExceeded(MAX_HOPS));
            }

            let task = tasks
                .get_mut(&current_id)
                .ok_or_else(|| RuntimeError::ActivatedChildNotFound {
                    node_name: flow.node_name(&current_id),
                })?;

            task.call(&self.deps).await.map_err(|err| {
                tracing::error!(
                    project = %flow.project_name,
                    node = %task.node_name,
                    error = %err,
                    "failed to execute node task"
                );
                err
            })?;

            if task.children.is_empty() {
                break;
            }

            let next_id = match task.activated_node_id.as_ref() {
                Some(id) if task.children.contains(id) => id.clone(),
                _ => {
                    tracing::error!(
                        project = %flow.project_name,
                        node = %task.node_name,
                        activated = ?task.activated_node_id,
                        "cannot find activated child node"
                    );
                    return Err(RuntimeError::ActivatedChildNotFound {
                        node_name: task.node_name.clone(),
                    });
                }
            };

            let output_request = task.output_request_body.clone();
            let output_response = task.output_response_body.clone();
            let request_headers = task.request_headers.clone();
            let response_headers = task.response_headers.clone();
            let flow_ctx = std::mem::take(&mut task.flow_ctx);

            let next = tasks
                .get_mut(&next_id)
                .ok_or_else(|| RuntimeError::ActivatedChildNotFound {
                    node_name: flow.node_name(&current_id),
                })?;
            next.input_request_body = output_request;
            next.input_response_body = output_response;
            next.request_headers = request_headers;
            next.response_headers = response_headers;
            next.flow_ctx = flow_ctx;

            current_id = next_id;
        }

        let terminal = tasks
            .get(&current_id)
            .ok_or_else(|| RuntimeError::ActivatedChildNotFound {
                node_name: flow.node_name(&current_id),
            })?;

        // System headers win over anything a node set.
        let mut response_headers = terminal.response_headers.clone();
        response_headers.retain(|name, _| !is_system_header(name));
        for (name, value) in &system_headers {
            response_headers.insert(name.clone(), value.clone());
        }

        Ok(FlowResponse {
            body: terminal.output_response_body.clone(),
            headers: response_headers,
        })
    }

    fn instantiate_tasks(
        &self,
        flow: &ExecFlow,
        request: &FlowRequest,
        headers: &HashMap<String, String>,
    ) -> Result<HashMap<String, FlowTask>, RuntimeError> {
        let mut tasks = HashMap::with_capacity(flow.topology.valid_node_ids.len());
        for node_id in &flow.topology.valid_node_ids {
            let program =
                flow.programs
                    .get(node_id)
                    .cloned()
                    .ok_or_else(|| RuntimeError::MissingProgram {
                        node_name: flow.node_name(node_id),
                    })?;
            tasks.insert(
                node_id.clone(),
                FlowTask {
                    node_id: node_id.clone(),
                    node_name: flow.node_name(node_id),
                    program,
                    children: HashSet::new(),
                    activated_node_id: None,
                    breaker: flow.breakers.get(node_id).cloned(),
                    mapping: flow.mappings.get(node_id).cloned(),
                    ctx: flow.ctx.clone(),
                    body: request.body.clone(),
                    input_request_body: None,
                    input_response_body: None,
                    output_request_body: None,
                    output_response_body: None,
                    request_headers: headers.clone(),
                    request_params: request.params.clone(),
                    response_headers: HashMap::new(),
                    flow_ctx: HashMap::new(),
                },
            );
        }

        for link in &flow.topology.links {
            let source =
                tasks
                    .get_mut(&link.source_id)
                    .ok_or_else(|| RuntimeError::MissingProgram {
                        node_name: flow.node_name(&link.source_id),
                    })?;
            source.children.insert(link.target_id.clone());
        }

        Ok(tasks)
    }
}

fn lowercase_keys(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
        .collect()
}
