use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::ConsistencyError;
use crate::model::{
    DataMappingProps, HttpMethod, PathParam, RouteDataType, RouteMeta, RouteOp, RouteSource,
};

/// Datetime literals use the editor's canonical format.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A pre-validated right-hand literal of a route guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum GuardLiteral {
    String(String),
    Integer(i64),
    Double(f64),
    /// Kept in canonical text form; parsing was proven at generation time.
    Datetime(String),
}

impl GuardLiteral {
    /// Validate the declared literal against its declared type. Fails the
    /// compile when the literal cannot parse.
    pub fn parse(meta: &RouteMeta, node_id: &str) -> Result<Self, ConsistencyError> {
        let value = meta.right_value.as_str();
        let bad = || ConsistencyError::BadRouteLiteral {
            value: value.to_string(),
            data_type: meta.data_type.as_str().to_string(),
            node_id: node_id.to_string(),
        };
        match meta.data_type {
            RouteDataType::String => Ok(GuardLiteral::String(value.to_string())),
            RouteDataType::Integer => value
                .trim()
                .parse::<i64>()
                .map(GuardLiteral::Integer)
                .map_err(|_| bad()),
            RouteDataType::Double => value
                .trim()
                .parse::<f64>()
                .map(GuardLiteral::Double)
                .map_err(|_| bad()),
            RouteDataType::Datetime => NaiveDateTime::parse_from_str(value.trim(), DATETIME_FORMAT)
                .map(|_| GuardLiteral::Datetime(value.trim().to_string()))
                .map_err(|_| bad()),
        }
    }
}

/// One guard of a multi-output route node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteGuard {
    pub source: RouteSource,
    pub key: String,
    pub op: RouteOp,
    pub literal: GuardLiteral,
}

/// One branch: guard plus the child activated when it matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteBranch {
    pub port_id: String,
    pub guard: RouteGuard,
    pub target_node_id: String,
}

/// Ordered branch list; first true guard wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteTable {
    pub branches: Vec<RouteBranch>,
}

/// Parameters of an HTTP node's outbound call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpCall {
    pub url: String,
    pub method: HttpMethod,
    pub timeout_secs: u64,
    #[serde(default)]
    pub path_params: Vec<PathParam>,
}

/// Assembled script of a CONVERT or END node. The source defines
/// `main(task)` and is syntax-checked at compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptBody {
    pub source: String,
}

/// The executable program of one atomic node; the unit the compiler
/// persists and the runtime interprets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeProgram {
    /// Project entry point: pure pass-through.
    Context,
    Http(HttpCall),
    Route(RouteTable),
    DataMapping(DataMappingProps),
    Script(ScriptBody),
}

impl NodeProgram {
    /// Canonical generated text persisted next to the artifact. Script nodes
    /// keep their assembled JS source; declarative nodes use the readable
    /// JSON rendering of the program.
    pub fn render_text(&self) -> String {
        match self {
            NodeProgram::Script(body) => body.source.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_default(),
        }
    }
}

/// Encode a program into compact artifact bytes.
pub fn encode_artifact(program: &NodeProgram) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(program)
}

/// Decode persisted artifact bytes back into a program.
pub fn decode_artifact(bytes: &[u8]) -> Result<NodeProgram, serde_json::Error> {
    serde_json::from_slice(bytes)
}
