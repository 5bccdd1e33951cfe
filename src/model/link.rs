use serde::{Deserialize, Serialize};

/// A directed edge between two ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowLink {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub source_port: String,
    pub target_port: String,
    pub project_id: i64,
}

impl FlowLink {
    pub fn new(
        id: impl Into<String>,
        source_id: impl Into<String>,
        source_port: impl Into<String>,
        target_id: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            source_port: source_port.into(),
            target_port: target_port.into(),
            project_id: 0,
        }
    }

    pub fn with_project(mut self, project_id: i64) -> Self {
        self.project_id = project_id;
        self
    }

    /// Two links are duplicates when the full endpoint tuple matches.
    pub fn same_endpoints(&self, other: &FlowLink) -> bool {
        self.source_id == other.source_id
            && self.source_port == other.source_port
            && self.target_id == other.target_id
            && self.target_port == other.target_port
    }
}
