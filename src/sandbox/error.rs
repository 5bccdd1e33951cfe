use thiserror::Error;

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("script syntax error: {0}")]
    Syntax(String),
    #[error("script execution error: {0}")]
    Execution(String),
    #[error("script exceeded its execution budget")]
    Timeout,
    #[error("script too large: max {max} bytes, got {actual}")]
    CodeTooLarge { max: usize, actual: usize },
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("sandbox internal error: {0}")]
    Internal(String),
}
