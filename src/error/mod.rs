//! Error taxonomy for the flow engine.
//!
//! Each layer owns one error enum: graph shape problems are
//! [`ConsistencyError`], batch compilation problems are [`CompileError`],
//! request-time problems are [`RuntimeError`] and resolve-time problems are
//! [`ResolveError`]. [`FlowError`] is the umbrella used at the crate
//! boundary.

mod consistency;
mod store_error;

pub use consistency::ConsistencyError;
pub use store_error::StoreError;

use thiserror::Error;

/// Errors raised while compiling a project's nodes into artifacts.
///
/// Messages carry the failing node's display name rather than its internal
/// id, so they can be surfaced to the graph editor as-is.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("graph consistency error: {0}")]
    Consistency(#[from] ConsistencyError),
    #[error("node [{node_name}] produced an empty program text")]
    EmptyProgramText { node_name: String },
    #[error("node [{node_name}] produced an empty artifact for a non-empty program")]
    EmptyArtifact { node_name: String },
    #[error("failed to compile script of node [{node_name}]: {message}")]
    ScriptCompile { node_name: String, message: String },
    #[error("failed to encode artifact of node [{node_name}]: {message}")]
    ArtifactEncode { node_name: String, message: String },
    #[error("project not found or changed, refresh and retry")]
    ProjectMissing,
    #[error("project is online, take it offline before compiling")]
    ProjectOnline,
    #[error("project was updated concurrently, refresh and resubmit")]
    VersionContention,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors raised while walking a compiled flow for one request.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("cannot find activated child node, current node is [{node_name}]")]
    ActivatedChildNotFound { node_name: String },
    #[error("execution path length exceeded the limit of {0}")]
    HopLimitExceeded(usize),
    #[error("request to node [{node_name}] failed, url={url}, {message}")]
    HttpCallFailed {
        node_name: String,
        url: String,
        message: String,
    },
    #[error("request to node [{node_name}] rejected, circuit breaker is open")]
    CircuitOpen { node_name: String },
    #[error("node [{node_name}] has no loaded program")]
    MissingProgram { node_name: String },
    #[error("script of node [{node_name}] failed: {message}")]
    ScriptFailed { node_name: String, message: String },
    #[error("data mapping of node [{node_name}] failed: {message}")]
    MappingFailed { node_name: String, message: String },
    #[error("request method [{actual}] does not match the configured method [{expected}]")]
    MethodMismatch { expected: String, actual: String },
    #[error("empty flow, cannot build an execution run")]
    EmptyFlow,
}

/// Errors raised while resolving a context path to an executable flow.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no project is bound to the context path [{0}]")]
    ProjectNotFound(String),
    #[error("project bound to the context path [{0}] is offline")]
    ProjectOffline(String),
    #[error("graph consistency error: {0}")]
    Consistency(#[from] ConsistencyError),
    #[error("node [{node_name}] of project [{project_name}] has no compiled artifact")]
    MissingArtifact {
        project_name: String,
        node_name: String,
    },
    #[error("failed to load artifact of node [{node_name}] in project [{project_name}]: {message}")]
    ArtifactDecode {
        project_name: String,
        node_name: String,
        message: String,
    },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Umbrella error for callers that cross component boundaries.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
