//! Bash script executor.
//!
//! Used for sites that wrap their directory tooling in shell scripts, and
//! by the test suite where PowerShell is unavailable.

use super::executor::{ScriptError, ScriptExecutor, ScriptInput, ScriptOutput};
use super::subprocess;

/// Executor for bash scripts.
pub struct ShellExecutor;

impl ScriptExecutor for ShellExecutor {
    async fn execute(
        &self,
        script_path: &str,
        input: ScriptInput,
    ) -> Result<ScriptOutput, ScriptError> {
        subprocess::ensure_script_exists(script_path).await?;
        let mut cmd = tokio::process::Command::new("bash");
        cmd.arg(script_path);
        subprocess::run_command(&mut cmd, input).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
