//! Shared fixtures: seeded project graphs and a minimal HTTP stub.

#![allow(dead_code)]

use std::collections::HashMap;

use flowgate::model::{
    DataMappingProps, FieldMapping, FlowLink, FlowNode, FlowPort, HttpProps, PortDirection,
    RouteDataType, RouteMeta, RouteOp, RouteSource,
};
use flowgate::{
    FlowEngine, HttpMethod, MemoryStore, ProjectRecord, ProjectState, TaskKind, ViewKind,
};

/// Opt-in engine logs for a test run (`RUST_LOG=debug cargo test -- --nocapture`).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

pub fn params(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// CONTEXT -> HTTP -> END. The END script surfaces the upstream response.
pub fn seed_http_project(store: &MemoryStore, id: i64, path: &str, http: HttpProps) {
    let nodes = vec![
        FlowNode::new("ctx", TaskKind::Context, ViewKind::Atomic).with_name("Entry"),
        FlowNode::new("http", TaskKind::Http, ViewKind::Atomic).with_name("Call Upstream"),
        FlowNode::new("end", TaskKind::End, ViewKind::Atomic).with_name("Respond"),
    ];
    let ports = vec![
        FlowPort::new("ctx-out", "ctx", PortDirection::Output),
        FlowPort::new("http-in", "http", PortDirection::Input),
        FlowPort::new("http-out", "http", PortDirection::Output).with_http(http),
        FlowPort::new("end-in", "end", PortDirection::Input),
    ];
    let links = vec![
        FlowLink::new("l1", "ctx", "ctx-out", "http", "http-in").with_project(id),
        FlowLink::new("l2", "http", "http-out", "end", "end-in").with_project(id),
    ];
    store.seed_project(ProjectRecord::new(id, "http-demo", path, HttpMethod::Get), nodes, ports, links);
}

/// CONTEXT -> ROUTE -> {END_A, END_B}. First branch `age >= 18`, second
/// branch `age >= 0` (the catch-all default under lenient coercion).
pub fn seed_route_project(store: &MemoryStore, id: i64, path: &str) {
    let nodes = vec![
        FlowNode::new("ctx", TaskKind::Context, ViewKind::Atomic).with_name("Entry"),
        FlowNode::new("route", TaskKind::Route, ViewKind::Atomic).with_name("Age Router"),
        FlowNode::new("end_a", TaskKind::End, ViewKind::Atomic).with_name("Adult"),
        FlowNode::new("end_b", TaskKind::End, ViewKind::Atomic).with_name("Minor"),
    ];
    let adult_guard = RouteMeta {
        source: RouteSource::ReqParam,
        key: "age".into(),
        data_type: RouteDataType::Integer,
        op: RouteOp::Ge,
        right_value: "18".into(),
    };
    let default_guard = RouteMeta {
        source: RouteSource::ReqParam,
        key: "age".into(),
        data_type: RouteDataType::Integer,
        op: RouteOp::Ge,
        right_value: "0".into(),
    };
    let ports = vec![
        FlowPort::new("ctx-out", "ctx", PortDirection::Output),
        FlowPort::new("route-in", "route", PortDirection::Input),
        FlowPort::new("route-p1", "route", PortDirection::Output)
            .with_order(1)
            .with_route_meta(vec![adult_guard]),
        FlowPort::new("route-p2", "route", PortDirection::Output)
            .with_order(2)
            .with_route_meta(vec![default_guard]),
        FlowPort::new("end-a-in", "end_a", PortDirection::Input)
            .with_script(r#"task.outputResponseBody = "A";"#),
        FlowPort::new("end-b-in", "end_b", PortDirection::Input)
            .with_script(r#"task.outputResponseBody = "B";"#),
    ];
    let links = vec![
        FlowLink::new("l1", "ctx", "ctx-out", "route", "route-in").with_project(id),
        FlowLink::new("l2", "route", "route-p1", "end_a", "end-a-in").with_project(id),
        FlowLink::new("l3", "route", "route-p2", "end_b", "end-b-in").with_project(id),
    ];
    store.seed_project(ProjectRecord::new(id, "route-demo", path, HttpMethod::Get), nodes, ports, links);
}

/// CONTEXT -> CONVERT -> END. The conversion script uppercases the request
/// body and the END script reflects it into the response.
pub fn seed_convert_project(store: &MemoryStore, id: i64, path: &str) {
    let nodes = vec![
        FlowNode::new("ctx", TaskKind::Context, ViewKind::Atomic).with_name("Entry"),
        FlowNode::new("conv", TaskKind::Convert, ViewKind::Atomic).with_name("Uppercase"),
        FlowNode::new("end", TaskKind::End, ViewKind::Atomic).with_name("Respond"),
    ];
    let ports = vec![
        FlowPort::new("ctx-out", "ctx", PortDirection::Output),
        FlowPort::new("conv-in", "conv", PortDirection::Input),
        FlowPort::new("conv-out", "conv", PortDirection::Output)
            .with_script("task.outputRequestBody = (task.inputRequestBody || '').toUpperCase();"),
        FlowPort::new("end-in", "end", PortDirection::Input)
            .with_script("task.outputResponseBody = task.inputRequestBody;"),
    ];
    let links = vec![
        FlowLink::new("l1", "ctx", "ctx-out", "conv", "conv-in").with_project(id),
        FlowLink::new("l2", "conv", "conv-out", "end", "end-in").with_project(id),
    ];
    store.seed_project(ProjectRecord::new(id, "convert-demo", path, HttpMethod::Post), nodes, ports, links);
}

/// CONTEXT -> DATA_MAPPING -> END remapping `userName` to `name`.
pub fn seed_mapping_project(store: &MemoryStore, id: i64, path: &str) {
    let nodes = vec![
        FlowNode::new("ctx", TaskKind::Context, ViewKind::Atomic).with_name("Entry"),
        FlowNode::new("map", TaskKind::DataMapping, ViewKind::Atomic).with_name("Remap"),
        FlowNode::new("end", TaskKind::End, ViewKind::Atomic).with_name("Respond"),
    ];
    let mapping = DataMappingProps {
        fields: vec![FieldMapping {
            source: "userName".into(),
            target: "name".into(),
        }],
    };
    let ports = vec![
        FlowPort::new("ctx-out", "ctx", PortDirection::Output),
        FlowPort::new("map-in", "map", PortDirection::Input),
        FlowPort::new("map-out", "map", PortDirection::Output).with_data_mapping(mapping),
        FlowPort::new("end-in", "end", PortDirection::Input)
            .with_script("task.outputResponseBody = task.inputRequestBody;"),
    ];
    let links = vec![
        FlowLink::new("l1", "ctx", "ctx-out", "map", "map-in").with_project(id),
        FlowLink::new("l2", "map", "map-out", "end", "end-in").with_project(id),
    ];
    store.seed_project(ProjectRecord::new(id, "mapping-demo", path, HttpMethod::Post), nodes, ports, links);
}

/// Compile the seeded (offline) project, then flip it online so the
/// resolver will serve it.
pub async fn compile_and_publish(store: &MemoryStore, engine: &FlowEngine, project_id: i64) {
    engine
        .compiles
        .compile_project(project_id, chrono::Utc::now())
        .await
        .expect("compile should succeed");
    store.set_project_state(project_id, ProjectState::Online);
}

/// Minimal HTTP/1.1 stub: answers every connection with a fixed response.
pub async fn start_stub(status: u16, body: &str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub addr");
    let body = body.to_string();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let body = body.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 8192];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status} OK\r\nContent-Length: {len}\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n{body}",
                    status = status,
                    len = body.len(),
                    body = body,
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}
