use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::compiler::FlowCompiler;
use crate::error::CompileError;
use crate::model::{CompileResult, CompileStatus, ProjectState};
use crate::store::{CompiledNodeUpdate, ProjectStore};

/// Attempts of the optimistic compile-version bump before giving up.
pub const VERSION_BUMP_RETRIES: usize = 10;

/// Drives the asynchronous compile pipeline for a project.
///
/// Compiles are single-flight per project id: a submit while one is already
/// running is answered with `false` instead of queuing duplicate work. The
/// outcome is observed through the project's compile-status metadata.
pub struct CompileService {
    store: Arc<dyn ProjectStore>,
    compiler: Arc<FlowCompiler>,
    in_flight: DashMap<i64, ()>,
}

impl CompileService {
    pub fn new(store: Arc<dyn ProjectStore>, compiler: Arc<FlowCompiler>) -> Self {
        Self {
            store,
            compiler,
            in_flight: DashMap::new(),
        }
    }

    /// Accept a compile request and run it in the background. Returns
    /// `false` when a compile of the same project is already in flight.
    pub async fn submit(self: &Arc<Self>, project_id: i64) -> Result<bool, CompileError> {
        let project = self
            .store
            .project_by_id(project_id)
            .await?
            .ok_or(CompileError::ProjectMissing)?;
        if project.state == ProjectState::Online {
            return Err(CompileError::ProjectOnline);
        }

        if self.in_flight.insert(project_id, ()).is_some() {
            tracing::warn!(project_id, "compile already in flight, rejecting submit");
            return Ok(false);
        }

        let requested_at = Utc::now();
        self.record_status(project_id, CompileStatus::Compiling, None, requested_at)
            .await;

        let service = self.clone();
        tokio::spawn(async move {
            if let Err(err) = service.compile_project(project_id, requested_at).await {
                tracing::error!(project_id, error = %err, "compile failed");
            }
            service.in_flight.remove(&project_id);
        });

        Ok(true)
    }

    /// The full compile pipeline, run to completion. Every exit path leaves
    /// a compile-status record behind.
    pub async fn compile_project(
        &self,
        project_id: i64,
        requested_at: DateTime<Utc>,
    ) -> Result<(), CompileError> {
        let queried = async {
            let nodes = self.store.nodes_by_project(project_id).await?;
            let ports = self.store.ports_by_project(project_id).await?;
            let links = self.store.links_by_project(project_id).await?;
            Ok::<_, crate::error::StoreError>((nodes, ports, links))
        }
        .await;

        let (nodes, ports, links) = match queried {
            Ok(data) => data,
            Err(err) => {
                tracing::error!(project_id, error = %err, "failed to query project graph");
                self.record_status(
                    project_id,
                    CompileStatus::QueryFailed,
                    Some("compile task failed to load the graph, resubmit".into()),
                    requested_at,
                )
                .await;
                return Err(err.into());
            }
        };

        let compiled = match self.compiler.compile_project(&nodes, &ports, &links).await {
            Ok(compiled) => compiled,
            Err(err) => {
                tracing::error!(project_id, error = %err, "compile failed");
                self.record_status(
                    project_id,
                    CompileStatus::CompileFailed,
                    Some(err.to_string()),
                    requested_at,
                )
                .await;
                return Err(err);
            }
        };

        let updates: Vec<CompiledNodeUpdate> = compiled
            .into_iter()
            .map(|node| CompiledNodeUpdate {
                node_id: node.node_id,
                script: node.text,
                artifact: node.artifact,
            })
            .collect();
        self.store.save_compiled_nodes(project_id, &updates).await?;

        if !self.bump_version_with_retries(project_id).await? {
            tracing::error!(
                project_id,
                retries = VERSION_BUMP_RETRIES,
                "version bump kept conflicting"
            );
            self.record_status(
                project_id,
                CompileStatus::CompileFailed,
                Some("someone else updated this project, refresh and resubmit".into()),
                requested_at,
            )
            .await;
            return Err(CompileError::VersionContention);
        }

        self.record_status(
            project_id,
            CompileStatus::CompileSuccess,
            Some("success".into()),
            requested_at,
        )
        .await;
        Ok(())
    }

    async fn bump_version_with_retries(&self, project_id: i64) -> Result<bool, CompileError> {
        for _ in 0..VERSION_BUMP_RETRIES {
            let current = self
                .store
                .project_by_id(project_id)
                .await?
                .ok_or(CompileError::ProjectMissing)?
                .compile_version;
            if self.store.bump_compile_version(project_id, current).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn record_status(
        &self,
        project_id: i64,
        status: CompileStatus,
        message: Option<String>,
        requested_at: DateTime<Utc>,
    ) {
        let result = CompileResult {
            status,
            message,
            requested_at,
        };
        if let Err(err) = self.store.update_compile_result(project_id, &result).await {
            tracing::error!(project_id, error = %err, "failed to record compile status");
        }
    }
}
