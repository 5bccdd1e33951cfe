use thiserror::Error;

/// Graph shape violations detected at edit, compile or resolve time.
///
/// These are never silently corrected: the offending operation or compile is
/// rejected and the message is shown to the user editing the graph.
#[derive(Debug, Error)]
pub enum ConsistencyError {
    #[error("no start node found, or the start node is unlinked")]
    StartNodeUnresolved,
    #[error("the graph must terminate in a response-handling node")]
    NoEndNode,
    #[error("node [{node_name}] terminates the graph but is not a response-handling node")]
    NonEndLeaf { node_name: String },
    #[error("a path starting at node [{node_name}] contains an unlinked port")]
    UnlinkedPort { node_name: String },
    #[error("the current version does not support graphs this large")]
    GraphTooLarge,
    #[error("cycle detected in the executable graph")]
    CycleDetected,
    #[error("cannot find node, id={0}")]
    NodeNotFound(String),
    #[error("cannot find port, id={0}")]
    PortNotFound(String),
    #[error("node [{node_name}] should have {expected} output port(s), found {actual}")]
    PortCountMismatch {
        node_name: String,
        expected: usize,
        actual: usize,
    },
    #[error("node [{node_name}] has an unconfigured port")]
    PortNotConfigured { node_name: String },
    #[error("route port [{port_id}] must carry exactly one condition, found {actual}")]
    MultiConditionPort { port_id: String, actual: usize },
    #[error("invalid route literal [{value}] for type {data_type}, node id={node_id}")]
    BadRouteLiteral {
        value: String,
        data_type: String,
        node_id: String,
    },
    #[error("node [{node_name}] generated an empty task program")]
    EmptyProgram { node_name: String },
    #[error("duplicate link: an edge with the same endpoints already exists")]
    DuplicateLink,
    #[error("a link must connect two distinct existing nodes")]
    InvalidLinkEndpoints,
    #[error("{0}")]
    LayerMismatch(String),
    #[error("empty node set, cannot build an execution flow")]
    EmptyNodeSet,
    #[error("empty link set, cannot build an execution flow")]
    EmptyLinkSet,
}
