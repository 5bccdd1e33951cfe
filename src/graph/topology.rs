use std::collections::{BTreeSet, HashSet};

use crate::error::ConsistencyError;
use crate::model::TaskKind;

use super::types::{FlatLink, FlowTopology, GraphIndex};

/// Resolve start/end/valid node sets over a flattened edge list.
///
/// A start candidate has no incoming edge and kind CONTEXT; exactly one must
/// exist. An end candidate has no outgoing edge and kind END; at least one
/// must exist.
pub fn resolve_topology(
    links: Vec<FlatLink>,
    index: &GraphIndex<'_>,
) -> Result<FlowTopology, ConsistencyError> {
    if links.is_empty() {
        return Err(ConsistencyError::EmptyLinkSet);
    }

    let mut sources: HashSet<&str> = HashSet::new();
    let mut targets: HashSet<&str> = HashSet::new();
    for link in &links {
        sources.insert(link.source_id.as_str());
        targets.insert(link.target_id.as_str());
    }

    // Deterministic ordering keeps error messages and downstream iteration
    // stable across runs.
    let all: BTreeSet<&str> = sources.union(&targets).copied().collect();

    let mut start_ids = Vec::new();
    for node_id in &all {
        if targets.contains(node_id) {
            continue;
        }
        if let Some(node) = index.nodes.get(node_id) {
            if node.task_kind == TaskKind::Context {
                start_ids.push((*node_id).to_string());
            }
        }
    }
    if start_ids.len() != 1 {
        return Err(ConsistencyError::StartNodeUnresolved);
    }

    let mut end_ids = Vec::new();
    for node_id in &all {
        if sources.contains(node_id) {
            continue;
        }
        if let Some(node) = index.nodes.get(node_id) {
            if node.task_kind == TaskKind::End {
                end_ids.push((*node_id).to_string());
            }
        }
    }
    if end_ids.is_empty() {
        return Err(ConsistencyError::NoEndNode);
    }

    let start_node_id = start_ids.remove(0);
    Ok(FlowTopology {
        start_node_id,
        end_node_ids: end_ids,
        valid_node_ids: all.into_iter().map(str::to_string).collect(),
        links,
    })
}
