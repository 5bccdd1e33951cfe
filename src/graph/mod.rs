//! Topology resolution: flatten the nested node/port/link graph into an
//! executable node-to-node graph and validate its shape.

mod flatten;
mod topology;
mod types;
mod validator;

pub use flatten::{actual_output_ports, atomic_nodes, flatten_links, MAX_CHASE_HOPS};
pub use topology::resolve_topology;
pub use types::{FlatLink, FlowTopology, GraphIndex};
pub use validator::{validate_flat_graph, validate_link};
