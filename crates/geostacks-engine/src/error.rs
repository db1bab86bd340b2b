//! Error types for the automation-engine client.

use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by stack lifecycle operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No stack with the given name exists in the project.
    #[error("stack '{0}' does not exist")]
    NotFound(String),

    /// A stack with the given name already exists.
    #[error("stack '{0}' already exists")]
    Conflict(String),

    /// Another update is already running against the stack.
    #[error("stack '{0}' already has an update in progress")]
    ConcurrentUpdate(String),

    /// The engine binary could not be located or spawned.
    #[error("failed to launch engine: {0}")]
    Spawn(String),

    /// The engine ran but the operation failed; message is the engine's own.
    #[error("engine {op} failed: {message}")]
    Command { op: &'static str, message: String },

    /// The engine produced output this client could not parse.
    #[error("malformed engine output for {op}: {message}")]
    Output { op: &'static str, message: String },

    /// A stack completed provisioning but is missing an expected output.
    #[error("stack '{stack}' has no '{output}' output")]
    MissingOutput { stack: String, output: String },

    /// The generated program could not be rendered to YAML.
    #[error("failed to render program: {0}")]
    Program(#[from] serde_yaml::Error),

    /// Workspace directory or program file could not be written.
    #[error("workspace error: {0}")]
    Workspace(#[from] std::io::Error),
}
