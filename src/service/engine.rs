use std::sync::Arc;

use crate::breaker::BreakerRegistry;
use crate::compiler::{ExecFlowCache, FlowCacheConfig, FlowCompiler};
use crate::error::FlowError;
use crate::runtime::{FlowExecutor, FlowRequest, FlowResponse, HttpCaller, HttpPoolConfig};
use crate::sandbox::JsSandbox;
use crate::store::ProjectStore;
use crate::time::{system_clock, TimeProvider};

use super::compile::CompileService;
use super::resolver::FlowResolver;

/// Everything wired together: the convenience entry point for embedders and
/// the transport layer.
pub struct FlowEngine {
    pub resolver: FlowResolver,
    pub executor: FlowExecutor,
    pub compiles: Arc<CompileService>,
}

impl FlowEngine {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self::with_clock(store, system_clock())
    }

    /// Build with an injected clock; tests pass a fake to drive cache TTL
    /// and breaker cool-down deterministically.
    pub fn with_clock(store: Arc<dyn ProjectStore>, clock: Arc<dyn TimeProvider>) -> Self {
        let sandbox = Arc::new(JsSandbox::default());
        let cache = Arc::new(ExecFlowCache::new(FlowCacheConfig::default(), clock.clone()));
        let breakers = Arc::new(BreakerRegistry::new(clock));
        let http = Arc::new(HttpCaller::new(HttpPoolConfig::default()));

        Self {
            resolver: FlowResolver::new(store.clone(), cache, breakers),
            executor: FlowExecutor::new(sandbox.clone(), http),
            compiles: Arc::new(CompileService::new(
                store,
                Arc::new(FlowCompiler::new(sandbox)),
            )),
        }
    }

    /// Resolve the context path and run the flow for one request.
    pub async fn handle(
        &self,
        context_path: &str,
        request: FlowRequest,
    ) -> Result<FlowResponse, FlowError> {
        let flow = self.resolver.resolve(context_path).await?;
        Ok(self.executor.execute(&flow, request).await?)
    }
}
