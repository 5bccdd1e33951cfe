//! Graph data model: nodes, ports, links and project records.
//!
//! Pure data with lookup helpers; all behavior lives in the graph, codegen
//! and runtime layers.

mod link;
mod node;
mod port;
mod project;

pub use link::FlowLink;
pub use node::{FlowNode, NodeProps, TaskKind, ViewKind, TOP_LEVEL_PARENT};
pub use port::{
    ContextProps, DataMappingProps, FieldMapping, FlowPort, HttpProps, PathParam, PortDirection,
    PortProps, RouteDataType, RouteMeta, RouteOp, RouteProps, RouteSource,
};
pub use project::{
    CompileResult, CompileStatus, HttpMethod, ProjectProps, ProjectRecord, ProjectState,
};
