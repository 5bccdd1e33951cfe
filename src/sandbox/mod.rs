//! Sandboxed JavaScript engine for CONVERT and END node scripts.
//!
//! User scripts define `function main(task)` and receive the task state as a
//! plain object; whatever they return (or the mutated `task`) is merged back
//! into the node's outputs. boa is synchronous, so request-time execution
//! runs under `spawn_blocking`.

mod error;
mod task_state;

pub use error::SandboxError;
pub use task_state::ScriptTask;

use std::time::{Duration, Instant};

use boa_engine::{Context, Source};

/// Sandbox limits.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Max script length in bytes.
    pub max_code_length: usize,
    /// Wall-clock execution budget, checked after evaluation.
    pub timeout: Duration,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            max_code_length: 20_000,
            timeout: Duration::from_secs(5),
        }
    }
}

pub struct JsSandbox {
    config: SandboxConfig,
}

impl JsSandbox {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    /// Syntax-check a script by evaluating its declarations in a throwaway
    /// context. Used by the compiler; runtime behavior is not exercised.
    pub async fn validate(&self, source: &str) -> Result<(), SandboxError> {
        self.check_length(source)?;
        let source = source.to_string();
        tokio::task::spawn_blocking(move || {
            let mut context = Context::default();
            context
                .eval(Source::from_bytes(source.as_bytes()))
                .map_err(|e| SandboxError::Syntax(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| SandboxError::Internal(e.to_string()))?
    }

    /// Run `main(task)` and return the merged task state.
    pub async fn execute(&self, source: &str, task: ScriptTask) -> Result<ScriptTask, SandboxError> {
        self.check_length(source)?;
        let source = source.to_string();
        let timeout = self.config.timeout;
        tokio::task::spawn_blocking(move || execute_blocking(&source, task, timeout))
            .await
            .map_err(|e| SandboxError::Internal(e.to_string()))?
    }

    fn check_length(&self, source: &str) -> Result<(), SandboxError> {
        if source.len() > self.config.max_code_length {
            return Err(SandboxError::CodeTooLarge {
                max: self.config.max_code_length,
                actual: source.len(),
            });
        }
        Ok(())
    }
}

impl Default for JsSandbox {
    fn default() -> Self {
        Self::new(SandboxConfig::default())
    }
}

fn execute_blocking(
    source: &str,
    task: ScriptTask,
    timeout: Duration,
) -> Result<ScriptTask, SandboxError> {
    let started = Instant::now();
    let mut context = Context::default();

    let task_json =
        serde_json::to_string(&task).map_err(|e| SandboxError::Serialization(e.to_string()))?;

    // Define the user's main(), then invoke it with the deserialized task.
    // Returning nothing falls back to the (possibly mutated) task object.
    let full_code = format!(
        r#"
{source}

(function() {{
    var task = JSON.parse('{task_json}');
    var result = main(task);
    return JSON.stringify(result === undefined || result === null ? task : result);
}})();
"#,
        source = source,
        task_json = escape_json_for_single_quotes(&task_json),
    );

    let value = context
        .eval(Source::from_bytes(full_code.as_bytes()))
        .map_err(|e| SandboxError::Execution(e.to_string()))?;

    if started.elapsed() > timeout {
        return Err(SandboxError::Timeout);
    }

    let result_json = value
        .as_string()
        .map(|s| s.to_std_string_escaped())
        .ok_or_else(|| SandboxError::Execution("main(task) must return an object".to_string()))?;

    let returned: ScriptTask = serde_json::from_str(&result_json)
        .map_err(|e| SandboxError::Serialization(format!("failed to parse script result: {e}")))?;

    Ok(task.merged_with(returned))
}

fn escape_json_for_single_quotes(json: &str) -> String {
    json.replace('\\', "\\\\").replace('\'', "\\'")
}
