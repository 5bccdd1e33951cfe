//! # Flowgate — a graph-compiled HTTP request pipeline engine
//!
//! `flowgate` is the compiler and runtime behind a visually-edited service
//! gateway: users assemble a project as a graph of typed nodes (HTTP call,
//! router, script conversion, data mapping, start/end markers) joined by
//! directed links, optionally nested in composite containers. The engine
//!
//! - **flattens** the nested node/port/link graph into an executable
//!   node-to-node graph and validates its shape (single start, terminating
//!   ends, no cycles, bounded size);
//! - **compiles** each atomic node's port configuration into a persistable
//!   [`codegen::NodeProgram`] artifact: declarative variants for HTTP,
//!   route and mapping nodes, a sandboxed JavaScript body for free-form
//!   conversion nodes;
//! - **serves** live traffic: a request's context path resolves through a
//!   version-stamped [`compiler::ExecFlowCache`] to an [`runtime::ExecFlow`],
//!   and a per-request walker drives fresh task instances from the start
//!   node to an end node, propagating request/response bodies and selecting
//!   branches in declared port order;
//! - **protects** outbound HTTP calls with per-node sliding-window circuit
//!   breakers and every walk with a hop limit.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use flowgate::{FlowEngine, FlowRequest, MemoryStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryStore::new());
//!     // ... seed the store with a project graph, then:
//!     let engine = FlowEngine::new(store);
//!     engine.compiles.submit(1).await.unwrap();
//!     let response = engine
//!         .handle("/demo", FlowRequest::default())
//!         .await
//!         .unwrap();
//!     println!("{:?}", response.body);
//! }
//! ```
//!
//! Persistence of the raw graph entities, HTTP transport plumbing and
//! authentication are external collaborators behind [`store::ProjectStore`].

pub mod breaker;
pub mod codegen;
pub mod compiler;
pub mod error;
pub mod evaluator;
pub mod graph;
pub mod mapping;
pub mod model;
pub mod runtime;
pub mod sandbox;
pub mod service;
pub mod store;
pub mod time;

pub use crate::breaker::{BreakerConfig, BreakerRegistry, BreakerState, CircuitBreaker};
pub use crate::codegen::NodeProgram;
pub use crate::compiler::{ExecFlowCache, FlowCacheConfig, FlowCompiler};
pub use crate::error::{
    CompileError, ConsistencyError, FlowError, ResolveError, RuntimeError, StoreError,
};
pub use crate::graph::{FlatLink, FlowTopology};
pub use crate::model::{
    CompileResult, CompileStatus, FlowLink, FlowNode, FlowPort, HttpMethod, HttpProps, PortProps,
    ProjectRecord, ProjectState, TaskKind, ViewKind,
};
pub use crate::runtime::{ExecFlow, FlowExecutor, FlowRequest, FlowResponse, MAX_HOPS};
pub use crate::sandbox::JsSandbox;
pub use crate::service::{CompileService, FlowEngine, FlowResolver};
pub use crate::store::{MemoryStore, ProjectStore};
pub use crate::time::{FakeTimeProvider, SystemTimeProvider, TimeProvider};
