//! Circuit breaking for HTTP nodes.
//!
//! One breaker per HTTP node, keyed by node id in a process-wide registry.
//! The breaker keeps a count-based sliding window of call outcomes: once the
//! window holds more than `minimum_calls` samples and the failure rate
//! reaches the threshold, it opens for `open_duration`, then admits
//! `half_open_permits` trial calls before deciding to close or re-open.

mod registry;
mod state;

pub use registry::BreakerRegistry;
pub use state::{BreakerSnapshot, BreakerState, CircuitBreaker};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ConsistencyError;
use crate::graph::GraphIndex;
use crate::model::{FlowPort, HttpProps, PortDirection, TaskKind};
use crate::time::TimeProvider;

/// Thresholds of one breaker, derived from the HTTP port's properties.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakerConfig {
    pub sliding_window_size: usize,
    pub minimum_calls: usize,
    /// Percentage, 0..=100.
    pub failure_rate_threshold: f32,
    pub open_duration: Duration,
    pub half_open_permits: usize,
}

impl BreakerConfig {
    pub fn from_http_props(props: &HttpProps) -> Self {
        Self {
            sliding_window_size: props.sliding_window_size.max(1),
            minimum_calls: props.minimum_number_of_calls,
            failure_rate_threshold: props.failure_rate_threshold,
            open_duration: Duration::from_secs(props.keep_open_state_in_seconds),
            half_open_permits: props.permitted_number_of_calls_in_half_open_state.max(1),
        }
    }
}

/// Build the node-id→breaker map for a project.
///
/// HTTP nodes without a configured output port are skipped silently: the
/// node is considered not yet fully configured and will fail at its first
/// request instead. More than one output port on an HTTP node means the
/// stored data is corrupted.
pub fn provision_breakers(
    index: &GraphIndex<'_>,
    ports: &[FlowPort],
    registry: &BreakerRegistry,
) -> Result<HashMap<String, Arc<CircuitBreaker>>, ConsistencyError> {
    let mut output_ports: HashMap<&str, Vec<&FlowPort>> = HashMap::new();
    for port in ports {
        if port.direction == PortDirection::Output {
            output_ports
                .entry(port.node_id.as_str())
                .or_default()
                .push(port);
        }
    }

    let mut breakers = HashMap::new();
    for (node_id, node) in &index.nodes {
        if node.task_kind != TaskKind::Http || !node.is_atomic() {
            continue;
        }
        let Some(node_ports) = output_ports.get(node_id) else {
            continue;
        };
        if node_ports.len() != 1 {
            tracing::error!(
                node_id = %node_id,
                ports = node_ports.len(),
                "http node has an illegal output port count, data may be corrupted"
            );
            return Err(ConsistencyError::PortCountMismatch {
                node_name: index.name_of(node_id),
                expected: 1,
                actual: node_ports.len(),
            });
        }
        let Some(http) = node_ports[0].props.http.as_ref() else {
            continue;
        };
        let config = BreakerConfig::from_http_props(http);
        breakers.insert(
            (*node_id).to_string(),
            registry.get_or_create(node_id, config),
        );
    }

    Ok(breakers)
}

/// Shared clock alias used across breaker construction sites.
pub type Clock = Arc<dyn TimeProvider>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FlowNode, HttpMethod, ViewKind};
    use crate::time::system_clock;

    #[test]
    fn test_config_from_http_props() {
        let mut props = HttpProps::new("http://up/api", HttpMethod::Get);
        props.sliding_window_size = 3;
        props.minimum_number_of_calls = 1;
        props.failure_rate_threshold = 50.0;
        props.keep_open_state_in_seconds = 30;
        props.permitted_number_of_calls_in_half_open_state = 2;

        let config = BreakerConfig::from_http_props(&props);
        assert_eq!(config.sliding_window_size, 3);
        assert_eq!(config.minimum_calls, 1);
        assert_eq!(config.failure_rate_threshold, 50.0);
        assert_eq!(config.open_duration, Duration::from_secs(30));
        assert_eq!(config.half_open_permits, 2);
    }

    #[test]
    fn test_provision_skips_unconfigured_http_node() {
        let nodes = vec![FlowNode::new("http", TaskKind::Http, ViewKind::Atomic)];
        let ports = vec![FlowPort::new("http-out", "http", PortDirection::Output)];
        let index = GraphIndex::build(&nodes, &ports, &[]);
        let registry = BreakerRegistry::new(system_clock());
        let breakers = provision_breakers(&index, &ports, &registry).unwrap();
        assert!(breakers.is_empty());
    }

    #[test]
    fn test_provision_rejects_two_output_ports() {
        let nodes =
            vec![FlowNode::new("http", TaskKind::Http, ViewKind::Atomic).with_name("Upstream")];
        let ports = vec![
            FlowPort::new("p1", "http", PortDirection::Output)
                .with_http(HttpProps::new("http://a", HttpMethod::Get)),
            FlowPort::new("p2", "http", PortDirection::Output)
                .with_http(HttpProps::new("http://b", HttpMethod::Get)),
        ];
        let index = GraphIndex::build(&nodes, &ports, &[]);
        let registry = BreakerRegistry::new(system_clock());
        let err = provision_breakers(&index, &ports, &registry).unwrap_err();
        assert!(matches!(
            err,
            ConsistencyError::PortCountMismatch {
                expected: 1,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_provision_creates_breaker_for_configured_node() {
        let nodes = vec![
            FlowNode::new("http", TaskKind::Http, ViewKind::Atomic),
            FlowNode::new("conv", TaskKind::Convert, ViewKind::Atomic),
        ];
        let ports = vec![
            FlowPort::new("http-out", "http", PortDirection::Output)
                .with_http(HttpProps::new("http://up/api", HttpMethod::Get)),
            FlowPort::new("conv-out", "conv", PortDirection::Output),
        ];
        let index = GraphIndex::build(&nodes, &ports, &[]);
        let registry = BreakerRegistry::new(system_clock());
        let breakers = provision_breakers(&index, &ports, &registry).unwrap();
        assert_eq!(breakers.len(), 1);
        assert!(breakers.contains_key("http"));
    }
}
