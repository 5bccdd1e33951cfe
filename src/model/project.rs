use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// HTTP methods a project can be bound to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// Whether the project currently serves traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectState {
    Online,
    Offline,
}

/// Lifecycle of a compile request, observed asynchronously by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompileStatus {
    Compiling,
    QueryFailed,
    CompileFailed,
    CompileSuccess,
}

/// Persisted outcome of the most recent compile request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileResult {
    pub status: CompileStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub requested_at: DateTime<Utc>,
}

/// Project property blob.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_result: Option<CompileResult>,
}

/// A project: one context path, one method, one graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: i64,
    pub name: String,
    pub context_path: String,
    pub method: HttpMethod,
    pub state: ProjectState,
    pub compile_version: i64,
    #[serde(default)]
    pub props: ProjectProps,
}

impl ProjectRecord {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        context_path: impl Into<String>,
        method: HttpMethod,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            context_path: context_path.into(),
            method,
            state: ProjectState::Offline,
            compile_version: 0,
            props: ProjectProps::default(),
        }
    }

    pub fn with_state(mut self, state: ProjectState) -> Self {
        self.state = state;
        self
    }
}
