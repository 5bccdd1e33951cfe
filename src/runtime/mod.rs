//! Request-time execution: task instances, the DAG walker and the outbound
//! HTTP caller.

mod context;
mod exec_flow;
mod executor;
mod http;
mod task;

pub use context::ExecContext;
pub use exec_flow::ExecFlow;
pub use executor::{FlowExecutor, FlowRequest, FlowResponse, MAX_HOPS};
pub use http::{HttpCaller, HttpPoolConfig};
pub use task::{FlowTask, RuntimeDeps};

/// Headers owned by the platform. They are reflected into the response
/// ahead of node output and can never be overwritten by it.
pub const SYSTEM_HEADERS: [&str; 4] = [
    "x-idempotent-id",
    "x-request-time",
    "x-anti-replay-nonce",
    "x-anti-replay-timestamp",
];

pub(crate) fn is_system_header(name: &str) -> bool {
    SYSTEM_HEADERS
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}
