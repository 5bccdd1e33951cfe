use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{FlowLink, FlowNode, FlowPort};

/// A flattened node-to-node edge. Composite pass-through has been removed:
/// both endpoints are atomic nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatLink {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub source_port: String,
    pub target_port: String,
}

/// The resolved executable shape of a project graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowTopology {
    pub start_node_id: String,
    pub end_node_ids: Vec<String>,
    /// Every node reachable through the flattened edge set, sorted for
    /// deterministic iteration.
    pub valid_node_ids: Vec<String>,
    pub links: Vec<FlatLink>,
}

impl FlowTopology {
    /// Outgoing flattened links per source node.
    pub fn links_by_source(&self) -> HashMap<&str, Vec<&FlatLink>> {
        let mut map: HashMap<&str, Vec<&FlatLink>> = HashMap::new();
        for link in &self.links {
            map.entry(link.source_id.as_str()).or_default().push(link);
        }
        map
    }

    pub fn is_end_node(&self, node_id: &str) -> bool {
        self.end_node_ids.iter().any(|id| id == node_id)
    }
}

/// Borrowed lookup tables over one project's raw graph entities.
pub struct GraphIndex<'a> {
    pub nodes: HashMap<&'a str, &'a FlowNode>,
    pub ports: HashMap<&'a str, &'a FlowPort>,
    /// Link leaving each source port; virtual-port chasing follows these.
    pub link_by_source_port: HashMap<&'a str, &'a FlowLink>,
    pub names: HashMap<&'a str, &'a str>,
}

impl<'a> GraphIndex<'a> {
    pub fn build(nodes: &'a [FlowNode], ports: &'a [FlowPort], links: &'a [FlowLink]) -> Self {
        let mut node_map = HashMap::with_capacity(nodes.len());
        let mut names = HashMap::with_capacity(nodes.len());
        for node in nodes {
            node_map.insert(node.id.as_str(), node);
            names.insert(node.id.as_str(), node.display_name());
        }
        let mut port_map = HashMap::with_capacity(ports.len());
        for port in ports {
            port_map.insert(port.id.as_str(), port);
        }
        let mut link_by_source_port = HashMap::with_capacity(links.len());
        for link in links {
            link_by_source_port.insert(link.source_port.as_str(), link);
        }
        Self {
            nodes: node_map,
            ports: port_map,
            link_by_source_port,
            names,
        }
    }

    pub fn name_of(&self, node_id: &str) -> String {
        self.names.get(node_id).unwrap_or(&node_id).to_string()
    }
}
