//! Data-mapping runtime handle.
//!
//! The visual mapping editor is an external collaborator; at runtime its
//! configuration boils down to a list of dotted source→target field paths
//! applied to the JSON request body. DATA_MAPPING nodes hold one shared
//! [`MappingRuntime`] per compiled flow.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::ConsistencyError;
use crate::graph::GraphIndex;
use crate::model::{DataMappingProps, FieldMapping, FlowPort, PortDirection, TaskKind};

/// Immutable conversion capability built from a port's mapping properties.
#[derive(Debug, Clone)]
pub struct MappingRuntime {
    fields: Vec<FieldMapping>,
}

impl MappingRuntime {
    pub fn from_props(props: &DataMappingProps) -> Self {
        Self {
            fields: props.fields.clone(),
        }
    }

    /// Convert a JSON body. An empty field list is the identity conversion.
    pub fn convert(&self, input: &str) -> Result<String, serde_json::Error> {
        if self.fields.is_empty() {
            return Ok(input.to_string());
        }

        let source: Value = serde_json::from_str(input)?;
        let mut target = Value::Object(Map::new());
        for field in &self.fields {
            if let Some(value) = lookup_path(&source, &field.source) {
                set_path(&mut target, &field.target, value.clone());
            }
        }
        serde_json::to_string(&target)
    }
}

fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

fn set_path(target: &mut Value, path: &str, value: Value) {
    let mut current = target;
    let segments: Vec<&str> = path.split('.').collect();
    for (i, segment) in segments.iter().enumerate() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        if i == segments.len() - 1 {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

/// Build the node-id→mapping-runtime map for a project's DATA_MAPPING
/// nodes. Unconfigured nodes are skipped like unconfigured HTTP nodes; a
/// DATA_MAPPING node with more than one output port is corrupted data.
pub fn provision_mappings(
    index: &GraphIndex<'_>,
    ports: &[FlowPort],
) -> Result<HashMap<String, Arc<MappingRuntime>>, ConsistencyError> {
    let mut output_ports: HashMap<&str, Vec<&FlowPort>> = HashMap::new();
    for port in ports {
        if port.direction == PortDirection::Output {
            output_ports
                .entry(port.node_id.as_str())
                .or_default()
                .push(port);
        }
    }

    let mut mappings = HashMap::new();
    for (node_id, node) in &index.nodes {
        if node.task_kind != TaskKind::DataMapping || !node.is_atomic() {
            continue;
        }
        let Some(node_ports) = output_ports.get(node_id) else {
            continue;
        };
        if node_ports.len() != 1 {
            return Err(ConsistencyError::PortCountMismatch {
                node_name: index.name_of(node_id),
                expected: 1,
                actual: node_ports.len(),
            });
        }
        let Some(props) = node_ports[0].props.data_mapping.as_ref() else {
            continue;
        };
        mappings.insert(
            (*node_id).to_string(),
            Arc::new(MappingRuntime::from_props(props)),
        );
    }

    Ok(mappings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn runtime(fields: &[(&str, &str)]) -> MappingRuntime {
        MappingRuntime {
            fields: fields
                .iter()
                .map(|(s, t)| FieldMapping {
                    source: s.to_string(),
                    target: t.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_flat_remap() {
        let rt = runtime(&[("userName", "name"), ("userAge", "age")]);
        let out = rt
            .convert(r#"{"userName":"alice","userAge":30}"#)
            .unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, json!({"name": "alice", "age": 30}));
    }

    #[test]
    fn test_nested_paths() {
        let rt = runtime(&[("user.profile.name", "name"), ("user.id", "ids.user")]);
        let out = rt
            .convert(r#"{"user":{"id":7,"profile":{"name":"bob"}}}"#)
            .unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, json!({"name": "bob", "ids": {"user": 7}}));
    }

    #[test]
    fn test_missing_source_field_is_skipped() {
        let rt = runtime(&[("absent", "there")]);
        let out = rt.convert(r#"{"present":1}"#).unwrap();
        assert_eq!(out, "{}");
    }

    #[test]
    fn test_empty_mapping_is_identity() {
        let rt = runtime(&[]);
        let out = rt.convert("not even json").unwrap();
        assert_eq!(out, "not even json");
    }

    #[test]
    fn test_invalid_json_input_errors() {
        let rt = runtime(&[("a", "b")]);
        assert!(rt.convert("{broken").is_err());
    }
}
