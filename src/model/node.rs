use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parent id of nodes that live on the top graph layer.
pub const TOP_LEVEL_PARENT: &str = "-1";

/// What a node does when it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    /// Project entry point; exactly one per project, top layer.
    Context,
    /// Outbound HTTP call, guarded by a circuit breaker.
    Http,
    /// Multi-branch router over request headers/params.
    Route,
    /// Free-form script transformation.
    Convert,
    /// Declarative field remapping of the request body.
    DataMapping,
    /// Terminal response-handling node.
    End,
    /// Composite container, rendered by the editor only.
    CompositeNormal,
    /// Composite end container, rendered by the editor only.
    CompositeEnd,
}

/// Whether a node is a leaf task or a nested container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViewKind {
    Atomic,
    Composite,
}

/// Free-form node properties maintained by the editor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeProps {
    /// Display name, used in every user-facing error message.
    #[serde(default)]
    pub name: String,
    /// Editor layout blob, opaque to the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Value>,
}

/// A unit of work in the project graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: String,
    pub task_kind: TaskKind,
    pub view_kind: ViewKind,
    /// Id of the enclosing composite container, [`TOP_LEVEL_PARENT`] for the
    /// top layer.
    pub parent_id: String,
    pub props: NodeProps,
    /// Generated program text, written back by the compiler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// Compiled artifact bytes, written back by the compiler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Vec<u8>>,
}

impl FlowNode {
    pub fn new(id: impl Into<String>, task_kind: TaskKind, view_kind: ViewKind) -> Self {
        Self {
            id: id.into(),
            task_kind,
            view_kind,
            parent_id: TOP_LEVEL_PARENT.to_string(),
            props: NodeProps::default(),
            script: None,
            artifact: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.props.name = name.into();
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = parent_id.into();
        self
    }

    pub fn is_atomic(&self) -> bool {
        self.view_kind == ViewKind::Atomic
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id == TOP_LEVEL_PARENT
    }

    pub fn display_name(&self) -> &str {
        if self.props.name.is_empty() {
            &self.id
        } else {
            &self.props.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_kind_serde() {
        let json = serde_json::to_string(&TaskKind::DataMapping).unwrap();
        assert_eq!(json, "\"DATA_MAPPING\"");
        let kind: TaskKind = serde_json::from_str("\"COMPOSITE_NORMAL\"").unwrap();
        assert_eq!(kind, TaskKind::CompositeNormal);
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let node = FlowNode::new("n1", TaskKind::Convert, ViewKind::Atomic);
        assert_eq!(node.display_name(), "n1");
        let node = node.with_name("Converter");
        assert_eq!(node.display_name(), "Converter");
    }

    #[test]
    fn test_top_level_sentinel() {
        let node = FlowNode::new("n1", TaskKind::Context, ViewKind::Atomic);
        assert!(node.is_top_level());
        let nested = node.with_parent("composite-1");
        assert!(!nested.is_top_level());
    }
}
