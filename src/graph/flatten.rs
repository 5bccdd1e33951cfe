use crate::error::ConsistencyError;
use crate::model::{FlowLink, FlowNode, FlowPort, PortDirection, TaskKind, ViewKind};

use super::types::{FlatLink, GraphIndex};

/// Upper bound on the virtual-port chase when resolving a link's actual
/// atomic target.
pub const MAX_CHASE_HOPS: usize = 90_000;

/// Only atomic nodes carry executable behavior.
pub fn atomic_nodes(nodes: &[FlowNode]) -> Vec<&FlowNode> {
    nodes.iter().filter(|n| n.is_atomic()).collect()
}

/// The ports that drive program generation: output ports of atomic nodes,
/// plus the single input port of each END node re-labelled as its effective
/// output (END nodes have no output ports in the editor).
pub fn actual_output_ports(
    ports: &[FlowPort],
    index: &GraphIndex<'_>,
) -> Result<Vec<FlowPort>, ConsistencyError> {
    let mut actual = Vec::new();
    for port in ports {
        let node = index
            .nodes
            .get(port.node_id.as_str())
            .ok_or_else(|| ConsistencyError::NodeNotFound(port.node_id.clone()))?;

        match port.direction {
            PortDirection::Output if node.view_kind == ViewKind::Atomic => {
                actual.push(port.clone());
            }
            PortDirection::Input if node.task_kind == TaskKind::End => {
                let mut effective = port.clone();
                effective.direction = PortDirection::Output;
                actual.push(effective);
            }
            _ => {}
        }
    }
    Ok(actual)
}

/// Rewrite raw links into atomic-to-atomic edges.
///
/// Links whose source node is composite are dropped: they originate from a
/// virtual boundary port and duplicate the link that actually enters the
/// container. Links whose target lands on a composite node are chased
/// through same-source-port successor links until an atomic node is found.
pub fn flatten_links(
    links: &[FlowLink],
    index: &GraphIndex<'_>,
) -> Result<Vec<FlatLink>, ConsistencyError> {
    let mut actual = Vec::with_capacity(links.len());

    for link in links {
        let source_node = index
            .nodes
            .get(link.source_id.as_str())
            .ok_or_else(|| ConsistencyError::NodeNotFound(link.source_id.clone()))?;
        if source_node.view_kind == ViewKind::Composite {
            continue;
        }

        let mut target_port_id = link.target_port.as_str();
        let mut hops = 0usize;
        let target_id = loop {
            hops += 1;
            if hops > MAX_CHASE_HOPS {
                return Err(ConsistencyError::GraphTooLarge);
            }

            let target_port = index
                .ports
                .get(target_port_id)
                .ok_or_else(|| ConsistencyError::PortNotFound(target_port_id.to_string()))?;
            let target_node = index
                .nodes
                .get(target_port.node_id.as_str())
                .ok_or_else(|| ConsistencyError::NodeNotFound(target_port.node_id.clone()))?;

            if target_node.view_kind == ViewKind::Atomic {
                break target_node.id.clone();
            }

            // The port belongs to a composite container: follow the link
            // leaving the same port into (or out of) the container.
            let next_link = index.link_by_source_port.get(target_port_id).ok_or_else(|| {
                ConsistencyError::UnlinkedPort {
                    node_name: index.name_of(&link.source_id),
                }
            })?;
            target_port_id = next_link.target_port.as_str();
        };

        actual.push(FlatLink {
            id: link.id.clone(),
            source_id: link.source_id.clone(),
            target_id,
            source_port: link.source_port.clone(),
            target_port: target_port_id.to_string(),
        });
    }

    Ok(actual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FlowLink, FlowNode, FlowPort, PortDirection, TaskKind, ViewKind};

    fn node(id: &str, kind: TaskKind, view: ViewKind) -> FlowNode {
        FlowNode::new(id, kind, view).with_name(id.to_uppercase())
    }

    fn port(id: &str, node_id: &str, direction: PortDirection) -> FlowPort {
        FlowPort::new(id, node_id, direction)
    }

    #[test]
    fn test_flatten_passes_atomic_links_through() {
        let nodes = vec![
            node("ctx", TaskKind::Context, ViewKind::Atomic),
            node("end", TaskKind::End, ViewKind::Atomic),
        ];
        let ports = vec![
            port("ctx-out", "ctx", PortDirection::Output),
            port("end-in", "end", PortDirection::Input),
        ];
        let links = vec![FlowLink::new("l1", "ctx", "ctx-out", "end", "end-in")];

        let index = GraphIndex::build(&nodes, &ports, &links);
        let flat = flatten_links(&links, &index).unwrap();
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].source_id, "ctx");
        assert_eq!(flat[0].target_id, "end");
    }

    #[test]
    fn test_flatten_chases_through_composite() {
        // ctx --> comp(virtual in) --> conv nested inside comp
        let nodes = vec![
            node("ctx", TaskKind::Context, ViewKind::Atomic),
            node("comp", TaskKind::CompositeNormal, ViewKind::Composite),
            node("conv", TaskKind::Convert, ViewKind::Atomic).with_parent("comp"),
        ];
        let ports = vec![
            port("ctx-out", "ctx", PortDirection::Output),
            port("comp-in", "comp", PortDirection::Input),
            port("conv-in", "conv", PortDirection::Input),
        ];
        let links = vec![
            FlowLink::new("l1", "ctx", "ctx-out", "comp", "comp-in"),
            // boundary pass-through: INPUT -> INPUT into the container
            FlowLink::new("l2", "comp", "comp-in", "conv", "conv-in"),
        ];

        let index = GraphIndex::build(&nodes, &ports, &links);
        let flat = flatten_links(&links, &index).unwrap();
        // l2 is dropped (composite source); l1 is rewritten to target conv.
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].source_id, "ctx");
        assert_eq!(flat[0].target_id, "conv");
        assert_eq!(flat[0].target_port, "conv-in");
    }

    #[test]
    fn test_flatten_unlinked_virtual_port() {
        let nodes = vec![
            node("ctx", TaskKind::Context, ViewKind::Atomic),
            node("comp", TaskKind::CompositeNormal, ViewKind::Composite),
        ];
        let ports = vec![
            port("ctx-out", "ctx", PortDirection::Output),
            port("comp-in", "comp", PortDirection::Input),
        ];
        let links = vec![FlowLink::new("l1", "ctx", "ctx-out", "comp", "comp-in")];

        let index = GraphIndex::build(&nodes, &ports, &links);
        let err = flatten_links(&links, &index).unwrap_err();
        assert!(matches!(err, ConsistencyError::UnlinkedPort { ref node_name } if node_name == "CTX"));
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let nodes = vec![
            node("ctx", TaskKind::Context, ViewKind::Atomic),
            node("comp", TaskKind::CompositeNormal, ViewKind::Composite),
            node("conv", TaskKind::Convert, ViewKind::Atomic).with_parent("comp"),
            node("end", TaskKind::End, ViewKind::Atomic),
        ];
        let ports = vec![
            port("ctx-out", "ctx", PortDirection::Output),
            port("comp-in", "comp", PortDirection::Input),
            port("conv-in", "conv", PortDirection::Input),
            port("conv-out", "conv", PortDirection::Output),
            port("comp-out", "comp", PortDirection::Output),
            port("end-in", "end", PortDirection::Input),
        ];
        let links = vec![
            FlowLink::new("l1", "ctx", "ctx-out", "comp", "comp-in"),
            FlowLink::new("l2", "comp", "comp-in", "conv", "conv-in"),
            FlowLink::new("l3", "conv", "conv-out", "comp", "comp-out"),
            FlowLink::new("l4", "comp", "comp-out", "end", "end-in"),
        ];

        let index = GraphIndex::build(&nodes, &ports, &links);
        let flat = flatten_links(&links, &index).unwrap();

        // Re-run flattening on the already-flat edge list.
        let as_links: Vec<FlowLink> = flat
            .iter()
            .map(|f| {
                FlowLink::new(
                    f.id.clone(),
                    f.source_id.clone(),
                    f.source_port.clone(),
                    f.target_id.clone(),
                    f.target_port.clone(),
                )
            })
            .collect();
        let index2 = GraphIndex::build(&nodes, &ports, &as_links);
        let flat2 = flatten_links(&as_links, &index2).unwrap();
        assert_eq!(flat, flat2);
    }

    #[test]
    fn test_actual_output_ports_relabels_end_input() {
        let nodes = vec![
            node("conv", TaskKind::Convert, ViewKind::Atomic),
            node("end", TaskKind::End, ViewKind::Atomic),
            node("comp", TaskKind::CompositeNormal, ViewKind::Composite),
        ];
        let ports = vec![
            port("conv-out", "conv", PortDirection::Output),
            port("conv-in", "conv", PortDirection::Input),
            port("end-in", "end", PortDirection::Input),
            port("comp-out", "comp", PortDirection::Output),
        ];
        let links = vec![];

        let index = GraphIndex::build(&nodes, &ports, &links);
        let actual = actual_output_ports(&ports, &index).unwrap();
        let ids: Vec<&str> = actual.iter().map(|p| p.id.as_str()).collect();
        // conv-out kept, end-in relabelled, conv-in and composite comp-out dropped.
        assert_eq!(ids, vec!["conv-out", "end-in"]);
        assert!(actual
            .iter()
            .all(|p| p.direction == PortDirection::Output));
    }
}
