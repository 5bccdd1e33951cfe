use serde::{Deserialize, Serialize};

use super::project::HttpMethod;

/// Direction of a port on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortDirection {
    Input,
    Output,
}

/// Where a route condition reads its left-hand value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteSource {
    ReqHeader,
    ReqParam,
}

/// Declared type of a route condition's operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteDataType {
    String,
    Integer,
    Double,
    Datetime,
}

impl RouteDataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteDataType::String => "STRING",
            RouteDataType::Integer => "INTEGER",
            RouteDataType::Double => "DOUBLE",
            RouteDataType::Datetime => "DATETIME",
        }
    }
}

/// Comparison operator of a route condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

/// One route condition: `<source[key]> <op> <right_value>` typed as
/// `data_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteMeta {
    pub source: RouteSource,
    pub key: String,
    pub data_type: RouteDataType,
    pub op: RouteOp,
    pub right_value: String,
}

/// Route section of a port's properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteProps {
    #[serde(default)]
    pub meta: Vec<RouteMeta>,
}

/// A `{name}` path variable in an HTTP node's URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathParam {
    pub name: String,
    #[serde(default)]
    pub default_value: String,
}

/// HTTP section of a port's properties: the outbound call plus the breaker
/// thresholds derived for the owning node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpProps {
    pub url: String,
    pub method: HttpMethod,
    /// Request timeout in seconds, capped by the editor at 120.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default)]
    pub path_params: Vec<PathParam>,
    #[serde(default = "default_sliding_window_size")]
    pub sliding_window_size: usize,
    #[serde(default = "default_minimum_calls")]
    pub minimum_number_of_calls: usize,
    /// Failure-rate threshold in percent.
    #[serde(default = "default_failure_rate_threshold")]
    pub failure_rate_threshold: f32,
    #[serde(default = "default_keep_open_seconds")]
    pub keep_open_state_in_seconds: u64,
    #[serde(default = "default_half_open_calls")]
    pub permitted_number_of_calls_in_half_open_state: usize,
}

fn default_request_timeout() -> u64 {
    120
}
fn default_sliding_window_size() -> usize {
    100
}
fn default_minimum_calls() -> usize {
    50
}
fn default_failure_rate_threshold() -> f32 {
    20.0
}
fn default_keep_open_seconds() -> u64 {
    60
}
fn default_half_open_calls() -> usize {
    10
}

/// Context section: the externally significant path/method of the start node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
}

/// One field remapping of the data-mapping configuration: dotted source path
/// to dotted target path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub source: String,
    pub target: String,
}

/// Data-mapping section of a port's properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataMappingProps {
    #[serde(default)]
    pub fields: Vec<FieldMapping>,
}

/// Typed port property union. At most one of the optional sections is
/// populated, depending on the owning node's task kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortProps {
    #[serde(default)]
    pub name: String,
    /// Declared order; branch priority on multi-output nodes.
    #[serde(default)]
    pub order: i32,
    /// Raw script body of script-bearing ports (CONVERT, END).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// Auxiliary declarations emitted ahead of the script body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addition_define: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteProps>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpProps>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextProps>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_mapping: Option<DataMappingProps>,
}

/// An attachment point on a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowPort {
    pub id: String,
    pub node_id: String,
    pub direction: PortDirection,
    pub props: PortProps,
}

impl FlowPort {
    pub fn new(
        id: impl Into<String>,
        node_id: impl Into<String>,
        direction: PortDirection,
    ) -> Self {
        Self {
            id: id.into(),
            node_id: node_id.into(),
            direction,
            props: PortProps::default(),
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.props.order = order;
        self
    }

    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.props.script = Some(script.into());
        self
    }

    pub fn with_route_meta(mut self, meta: Vec<RouteMeta>) -> Self {
        self.props.route = Some(RouteProps { meta });
        self
    }

    pub fn with_http(mut self, http: HttpProps) -> Self {
        self.props.http = Some(http);
        self
    }

    pub fn with_data_mapping(mut self, mapping: DataMappingProps) -> Self {
        self.props.data_mapping = Some(mapping);
        self
    }
}

impl HttpProps {
    pub fn new(url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            url: url.into(),
            method,
            request_timeout: default_request_timeout(),
            path_params: Vec::new(),
            sliding_window_size: default_sliding_window_size(),
            minimum_number_of_calls: default_minimum_calls(),
            failure_rate_threshold: default_failure_rate_threshold(),
            keep_open_state_in_seconds: default_keep_open_seconds(),
            permitted_number_of_calls_in_half_open_state: default_half_open_calls(),
        }
    }
}
