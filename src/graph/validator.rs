use std::collections::HashMap;

use petgraph::stable_graph::{NodeIndex, StableDiGraph};

use crate::error::ConsistencyError;
use crate::model::{FlowLink, FlowNode, FlowPort, PortDirection};

use super::types::{FlowTopology, GraphIndex};

/// Edit-time validation of a new link against the existing graph.
///
/// The port compatibility rule depends on whether the endpoint nodes share a
/// graph layer: same layer requires OUTPUT→INPUT, a link entering a
/// container requires INPUT→INPUT, a link leaving a container requires
/// OUTPUT→OUTPUT (virtual boundary ports have no behavior of their own).
pub fn validate_link(
    link: &FlowLink,
    source_node: &FlowNode,
    target_node: &FlowNode,
    source_port: &FlowPort,
    target_port: &FlowPort,
    existing: &[FlowLink],
) -> Result<(), ConsistencyError> {
    if existing.iter().any(|l| l.same_endpoints(link)) {
        return Err(ConsistencyError::DuplicateLink);
    }
    if source_node.id == target_node.id {
        return Err(ConsistencyError::InvalidLinkEndpoints);
    }
    if source_port.node_id != source_node.id || target_port.node_id != target_node.id {
        return Err(ConsistencyError::InvalidLinkEndpoints);
    }

    let source_top = source_node.is_top_level();
    let target_top = target_node.is_top_level();

    let expected = if source_top == target_top {
        (PortDirection::Output, PortDirection::Input)
    } else if source_top {
        // Crossing from the top layer into a container.
        (PortDirection::Input, PortDirection::Input)
    } else {
        // Crossing out of a container back to the top layer.
        (PortDirection::Output, PortDirection::Output)
    };

    if (source_port.direction, target_port.direction) != expected {
        return Err(ConsistencyError::LayerMismatch(format!(
            "link requires {:?} source and {:?} target ports for these layers, found {:?} and {:?}",
            expected.0, expected.1, source_port.direction, target_port.direction
        )));
    }

    Ok(())
}

/// Validate the flattened executable graph: the hop limit at request time is
/// only a backstop, cycles are rejected here first.
pub fn validate_flat_graph(
    topology: &FlowTopology,
    index: &GraphIndex<'_>,
) -> Result<(), ConsistencyError> {
    let mut graph: StableDiGraph<&str, &str> = StableDiGraph::new();
    let mut indices: HashMap<&str, NodeIndex> = HashMap::new();

    for node_id in &topology.valid_node_ids {
        if !index.nodes.contains_key(node_id.as_str()) {
            return Err(ConsistencyError::NodeNotFound(node_id.clone()));
        }
        let idx = graph.add_node(node_id.as_str());
        indices.insert(node_id.as_str(), idx);
    }

    for link in &topology.links {
        let (Some(&source), Some(&target)) = (
            indices.get(link.source_id.as_str()),
            indices.get(link.target_id.as_str()),
        ) else {
            return Err(ConsistencyError::InvalidLinkEndpoints);
        };
        graph.add_edge(source, target, link.id.as_str());
    }

    if petgraph::algo::is_cyclic_directed(&graph) {
        return Err(ConsistencyError::CycleDetected);
    }

    Ok(())
}
