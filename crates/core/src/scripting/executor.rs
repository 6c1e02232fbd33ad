//! Script execution interface and shared types.
//!
//! Defines [`ScriptExecutor`], the trait every runtime executor implements,
//! along with [`ScriptInput`], [`ScriptOutput`], and [`ScriptError`].

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

/// Input passed to a snapshot script.
#[derive(Debug, Clone)]
pub struct ScriptInput {
    /// JSON request piped to the script's stdin.
    pub data: Value,
    /// Additional environment variables set for the child process.
    pub env_vars: Vec<(String, String)>,
    /// Working directory for the child process (uses current dir if `None`).
    pub working_directory: Option<String>,
    /// Maximum wall-clock time before the process is killed.
    pub timeout: Duration,
}

impl ScriptInput {
    /// Input with the given request payload and timeout, no extra env vars.
    pub fn new(data: Value, timeout: Duration) -> Self {
        Self {
            data,
            env_vars: Vec::new(),
            working_directory: None,
            timeout,
        }
    }
}

/// Captured output from a script run.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptOutput {
    pub stdout: String,
    pub stderr: String,
    /// Process exit code (`-1` if killed by signal).
    pub exit_code: i32,
    pub duration_ms: u64,
    /// Stdout parsed as JSON, or `None` if stdout is not valid JSON.
    pub parsed_output: Option<Value>,
}

impl ScriptOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Errors that can occur while running a snapshot script.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Script not found: {0}")]
    NotFound(String),

    #[error("Script timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("Script failed with exit code {exit_code}: {stderr}")]
    ExecutionFailed { exit_code: i32, stderr: String },

    #[error("I/O error: {0}")]
    IoError(#[source] std::io::Error),
}

/// Trait implemented by the script runtimes (PowerShell, bash).
pub trait ScriptExecutor: Send + Sync {
    /// Run the script at `script_path` with the given `input`.
    ///
    /// A non-zero exit code is reported through [`ScriptOutput::exit_code`],
    /// not as an error; callers decide whether that is fatal.
    fn execute(
        &self,
        script_path: &str,
        input: ScriptInput,
    ) -> impl std::future::Future<Output = Result<ScriptOutput, ScriptError>> + Send;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
