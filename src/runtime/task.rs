use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;

use crate::breaker::CircuitBreaker;
use crate::codegen::{HttpCall, NodeProgram};
use crate::error::RuntimeError;
use crate::evaluator::select_branch;
use crate::mapping::MappingRuntime;
use crate::sandbox::{JsSandbox, ScriptTask};

use super::context::ExecContext;
use super::http::HttpCaller;

/// Shared collaborators every task needs while running.
pub struct RuntimeDeps {
    pub sandbox: Arc<JsSandbox>,
    pub http: Arc<HttpCaller>,
}

/// Per-request, per-node mutable state. Created fresh for every request and
/// never shared across requests.
pub struct FlowTask {
    pub node_id: String,
    pub node_name: String,
    pub program: Arc<NodeProgram>,
    /// Reachable children; exactly one is activated per step.
    pub children: HashSet<String>,
    pub activated_node_id: Option<String>,
    pub breaker: Option<Arc<CircuitBreaker>>,
    pub mapping: Option<Arc<MappingRuntime>>,
    /// Project-scoped context shared by every run of the compiled flow.
    pub ctx: Arc<ExecContext>,

    /// Original request body, never rewritten.
    pub body: Option<String>,
    pub input_request_body: Option<String>,
    pub input_response_body: Option<String>,
    pub output_request_body: Option<String>,
    pub output_response_body: Option<String>,
    /// Lowercase-keyed request headers, shared verbatim by all tasks.
    pub request_headers: HashMap<String, String>,
    pub request_params: HashMap<String, String>,
    pub response_headers: HashMap<String, String>,
    /// Per-run scratch state carried along the walked path.
    pub flow_ctx: HashMap<String, Value>,
}

impl FlowTask {
    /// Run this node's program once.
    ///
    /// Outputs are pre-seeded from the inputs before dispatch, so a program
    /// that does not touch them implements the documented pass-through
    /// default. Branch selection: route programs activate only a matched
    /// branch; every other program auto-activates its single child.
    pub async fn call(&mut self, deps: &RuntimeDeps) -> Result<(), RuntimeError> {
        self.output_request_body = self.input_request_body.clone();
        self.output_response_body = self.input_response_body.clone();
        self.activated_node_id = None;

        let program = self.program.clone();
        let mut routed = false;
        match program.as_ref() {
            NodeProgram::Context => {}
            NodeProgram::Http(call) => self.run_http(call, deps).await?,
            NodeProgram::Route(table) => {
                routed = true;
                if let Some(branch) =
                    select_branch(table, &self.request_headers, &self.request_params)
                {
                    self.activated_node_id = Some(branch.target_node_id.clone());
                }
            }
            NodeProgram::DataMapping(_) => self.run_mapping()?,
            NodeProgram::Script(script) => self.run_script(&script.source, deps).await?,
        }

        if !routed && self.activated_node_id.is_none() && self.children.len() == 1 {
            self.activated_node_id = self.children.iter().next().cloned();
        }

        Ok(())
    }

    async fn run_http(&mut self, call: &HttpCall, deps: &RuntimeDeps) -> Result<(), RuntimeError> {
        let url = HttpCaller::resolve_url(call, &self.request_params);

        let Some(breaker) = self.breaker.clone() else {
            let body = deps
                .http
                .call(
                    call,
                    &url,
                    &self.request_headers,
                    self.input_request_body.as_deref(),
                    &self.node_name,
                )
                .await?;
            self.output_response_body = Some(body);
            return Ok(());
        };

        if !breaker.try_acquire() {
            tracing::error!(
                node = %self.node_name,
                url,
                "request rejected, circuit breaker is open"
            );
            return Err(RuntimeError::CircuitOpen {
                node_name: self.node_name.clone(),
            });
        }

        match deps
            .http
            .call(
                call,
                &url,
                &self.request_headers,
                self.input_request_body.as_deref(),
                &self.node_name,
            )
            .await
        {
            Ok(body) => {
                breaker.record_success();
                self.output_response_body = Some(body);
                Ok(())
            }
            Err(err) => {
                breaker.record_failure();
                Err(err)
            }
        }
    }

    fn run_mapping(&mut self) -> Result<(), RuntimeError> {
        let Some(mapping) = self.mapping.as_ref() else {
            return Err(RuntimeError::MappingFailed {
                node_name: self.node_name.clone(),
                message: "node is not fully configured".into(),
            });
        };
        let input = self.input_request_body.as_deref().unwrap_or("");
        let converted = mapping
            .convert(input)
            .map_err(|e| RuntimeError::MappingFailed {
                node_name: self.node_name.clone(),
                message: e.to_string(),
            })?;
        self.output_request_body = Some(converted);
        Ok(())
    }

    async fn run_script(&mut self, source: &str, deps: &RuntimeDeps) -> Result<(), RuntimeError> {
        let state = ScriptTask {
            body: self.body.clone(),
            input_request_body: self.input_request_body.clone(),
            input_response_body: self.input_response_body.clone(),
            output_request_body: self.output_request_body.clone(),
            output_response_body: self.output_response_body.clone(),
            request_headers: self.request_headers.clone(),
            request_params: self.request_params.clone(),
            response_headers: self.response_headers.clone(),
        };

        let result =
            deps.sandbox
                .execute(source, state)
                .await
                .map_err(|e| RuntimeError::ScriptFailed {
                    node_name: self.node_name.clone(),
                    message: e.to_string(),
                })?;

        self.output_request_body = result.output_request_body;
        self.output_response_body = result.output_response_body;
        self.request_headers = result.request_headers;
        self.response_headers = result.response_headers;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{GuardLiteral, RouteBranch, RouteGuard, RouteTable};
    use crate::model::{RouteOp, RouteSource};

    fn deps() -> RuntimeDeps {
        RuntimeDeps {
            sandbox: Arc::new(JsSandbox::default()),
            http: Arc::new(HttpCaller::default()),
        }
    }

    fn task(program: NodeProgram) -> FlowTask {
        FlowTask {
            node_id: "n1".into(),
            node_name: "Node One".into(),
            program: Arc::new(program),
            children: HashSet::new(),
            activated_node_id: None,
            breaker: None,
            mapping: None,
            ctx: Arc::new(ExecContext::new()),
            body: None,
            input_request_body: Some("req".into()),
            input_response_body: Some("rsp".into()),
            output_request_body: None,
            output_response_body: None,
            request_headers: HashMap::new(),
            request_params: HashMap::new(),
            response_headers: HashMap::new(),
            flow_ctx: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_context_passes_through_and_activates_single_child() {
        let mut t = task(NodeProgram::Context);
        t.children.insert("next".into());
        t.call(&deps()).await.unwrap();
        assert_eq!(t.output_request_body.as_deref(), Some("req"));
        assert_eq!(t.output_response_body.as_deref(), Some("rsp"));
        assert_eq!(t.activated_node_id.as_deref(), Some("next"));
    }

    #[tokio::test]
    async fn test_non_route_with_two_children_activates_nothing() {
        let mut t = task(NodeProgram::Context);
        t.children.insert("a".into());
        t.children.insert("b".into());
        t.call(&deps()).await.unwrap();
        assert!(t.activated_node_id.is_none());
    }

    #[tokio::test]
    async fn test_route_does_not_fall_back_to_single_child() {
        let table = RouteTable {
            branches: vec![RouteBranch {
                port_id: "p1".into(),
                guard: RouteGuard {
                    source: RouteSource::ReqParam,
                    key: "v".into(),
                    op: RouteOp::Gt,
                    literal: GuardLiteral::Integer(10),
                },
                target_node_id: "a".into(),
            }],
        };
        let mut t = task(NodeProgram::Route(table));
        t.children.insert("a".into());
        // Guard is false (param missing -> 0): no branch taken, even though
        // exactly one child exists.
        t.call(&deps()).await.unwrap();
        assert!(t.activated_node_id.is_none());
        // Default body propagation still happened.
        assert_eq!(t.output_request_body.as_deref(), Some("req"));
    }

    #[tokio::test]
    async fn test_route_activates_matched_branch() {
        let table = RouteTable {
            branches: vec![RouteBranch {
                port_id: "p1".into(),
                guard: RouteGuard {
                    source: RouteSource::ReqParam,
                    key: "v".into(),
                    op: RouteOp::Gt,
                    literal: GuardLiteral::Integer(10),
                },
                target_node_id: "a".into(),
            }],
        };
        let mut t = task(NodeProgram::Route(table));
        t.children.insert("a".into());
        t.request_params.insert("v".into(), "20".into());
        t.call(&deps()).await.unwrap();
        assert_eq!(t.activated_node_id.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_unconfigured_mapping_node_fails() {
        let mut t = task(NodeProgram::DataMapping(Default::default()));
        let err = t.call(&deps()).await.unwrap_err();
        assert!(matches!(err, RuntimeError::MappingFailed { .. }));
    }

    #[tokio::test]
    async fn test_script_failure_names_the_node() {
        let mut t = task(NodeProgram::Script(crate::codegen::ScriptBody {
            source: "function main(task) { throw new Error('boom'); }".into(),
        }));
        let err = t.call(&deps()).await.unwrap_err();
        match err {
            RuntimeError::ScriptFailed { node_name, message } => {
                assert_eq!(node_name, "Node One");
                assert!(message.contains("boom"));
            }
            other => panic!("expected ScriptFailed, got {other}"),
        }
    }
}
