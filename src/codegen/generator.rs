use std::collections::HashMap;

use crate::error::ConsistencyError;
use crate::graph::{FlowTopology, GraphIndex};
use crate::model::{FlowPort, TaskKind};

use super::program::{
    GuardLiteral, HttpCall, NodeProgram, RouteBranch, RouteGuard, RouteTable, ScriptBody,
};

/// Output of generation for one node: the program plus its canonical text.
#[derive(Debug, Clone)]
pub struct GeneratedNode {
    pub node_id: String,
    pub program: NodeProgram,
    pub text: String,
}

/// Generate a program for every valid node of the resolved topology.
///
/// `output_ports` are the effective output ports (atomic outputs plus END
/// inputs relabelled by [`crate::graph::actual_output_ports`]).
pub fn generate_programs(
    topology: &FlowTopology,
    output_ports: &[FlowPort],
    index: &GraphIndex<'_>,
) -> Result<Vec<GeneratedNode>, ConsistencyError> {
    let mut ports_by_node: HashMap<&str, Vec<&FlowPort>> = HashMap::new();
    for port in output_ports {
        ports_by_node
            .entry(port.node_id.as_str())
            .or_default()
            .push(port);
    }
    // Declared order is the branch priority; port id breaks ties so the
    // result is stable.
    for ports in ports_by_node.values_mut() {
        ports.sort_by(|a, b| {
            a.props
                .order
                .cmp(&b.props.order)
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    let links_by_source = topology.links_by_source();

    let mut generated = Vec::with_capacity(topology.valid_node_ids.len());
    for node_id in &topology.valid_node_ids {
        // Stale links may reference nodes that were deleted or never atomic.
        let node = index
            .nodes
            .get(node_id.as_str())
            .filter(|n| n.is_atomic())
            .ok_or_else(|| ConsistencyError::NodeNotFound(node_id.clone()))?;
        let node_name = node.display_name().to_string();

        let ports = ports_by_node.get(node_id.as_str()).cloned().unwrap_or_default();
        let out_links = links_by_source.get(node_id.as_str()).cloned().unwrap_or_default();

        let program = if out_links.is_empty() {
            if node.task_kind != TaskKind::End {
                return Err(ConsistencyError::NonEndLeaf { node_name });
            }
            let port = single_port(&ports, &node_name)?;
            NodeProgram::Script(ScriptBody {
                source: assemble_script(port),
            })
        } else if node.task_kind == TaskKind::Route {
            // A route node keeps the multi-branch shape even with a single
            // declared branch.
            generate_route(node_id, &node_name, &ports, &out_links)?
        } else {
            let port = single_port(&ports, &node_name)?;
            match node.task_kind {
                TaskKind::Context => NodeProgram::Context,
                TaskKind::Http => {
                    let http = port.props.http.as_ref().ok_or_else(|| {
                        ConsistencyError::PortNotConfigured {
                            node_name: node_name.clone(),
                        }
                    })?;
                    NodeProgram::Http(HttpCall {
                        url: http.url.clone(),
                        method: http.method,
                        timeout_secs: http.request_timeout,
                        path_params: http.path_params.clone(),
                    })
                }
                TaskKind::Convert | TaskKind::End => NodeProgram::Script(ScriptBody {
                    source: assemble_script(port),
                }),
                TaskKind::DataMapping => {
                    let mapping = port.props.data_mapping.as_ref().ok_or_else(|| {
                        ConsistencyError::PortNotConfigured {
                            node_name: node_name.clone(),
                        }
                    })?;
                    NodeProgram::DataMapping(mapping.clone())
                }
                TaskKind::Route | TaskKind::CompositeNormal | TaskKind::CompositeEnd => {
                    return Err(ConsistencyError::NodeNotFound(node_id.clone()))
                }
            }
        };

        let text = program.render_text();
        if text.trim().is_empty() {
            return Err(ConsistencyError::EmptyProgram { node_name });
        }

        generated.push(GeneratedNode {
            node_id: node_id.clone(),
            program,
            text,
        });
    }

    Ok(generated)
}

fn single_port<'a>(
    ports: &[&'a FlowPort],
    node_name: &str,
) -> Result<&'a FlowPort, ConsistencyError> {
    if ports.len() != 1 {
        return Err(ConsistencyError::PortCountMismatch {
            node_name: node_name.to_string(),
            expected: 1,
            actual: ports.len(),
        });
    }
    Ok(ports[0])
}

fn generate_route(
    node_id: &str,
    node_name: &str,
    ports: &[&FlowPort],
    out_links: &[&crate::graph::FlatLink],
) -> Result<NodeProgram, ConsistencyError> {
    if ports.is_empty() {
        return Err(ConsistencyError::PortCountMismatch {
            node_name: node_name.to_string(),
            expected: 1,
            actual: 0,
        });
    }

    let mut link_by_source_port: HashMap<&str, &crate::graph::FlatLink> = HashMap::new();
    for link in out_links {
        link_by_source_port.insert(link.source_port.as_str(), link);
    }

    let mut branches = Vec::with_capacity(ports.len());
    for port in ports {
        let meta = port
            .props
            .route
            .as_ref()
            .map(|r| r.meta.as_slice())
            .unwrap_or_default();
        if meta.is_empty() {
            return Err(ConsistencyError::PortNotConfigured {
                node_name: node_name.to_string(),
            });
        }
        if meta.len() != 1 {
            return Err(ConsistencyError::MultiConditionPort {
                port_id: port.id.clone(),
                actual: meta.len(),
            });
        }
        let meta = &meta[0];

        let link = link_by_source_port.get(port.id.as_str()).ok_or_else(|| {
            ConsistencyError::UnlinkedPort {
                node_name: node_name.to_string(),
            }
        })?;

        branches.push(RouteBranch {
            port_id: port.id.clone(),
            guard: RouteGuard {
                source: meta.source,
                key: meta.key.clone(),
                op: meta.op,
                literal: GuardLiteral::parse(meta, node_id)?,
            },
            target_node_id: link.target_id.clone(),
        });
    }

    Ok(NodeProgram::Route(RouteTable { branches }))
}

/// Assemble the persisted JS source of a script-bearing port: auxiliary
/// declarations first, then the user body wrapped as `main(task)`. An empty
/// body leaves the pre-seeded outputs untouched, which is the documented
/// pass-through default.
fn assemble_script(port: &FlowPort) -> String {
    let addition = port.props.addition_define.as_deref().unwrap_or("").trim();
    let body = port.props.script.as_deref().unwrap_or("").trim();

    let mut source = String::new();
    if !addition.is_empty() {
        source.push_str(addition);
        source.push_str("\n\n");
    }
    source.push_str("function main(task) {\n");
    if !body.is_empty() {
        source.push_str(body);
        source.push('\n');
    }
    source.push_str("return task;\n}");
    source
}
