//! PowerShell script executor.
//!
//! Spawns `pwsh` (or a configured host such as `powershell.exe`) with
//! `-NoProfile -NonInteractive -File <script>`. The JSON request arrives on
//! stdin; scripts read it with `$input | ConvertFrom-Json`.

use super::executor::{ScriptError, ScriptExecutor, ScriptInput, ScriptOutput};
use super::subprocess;

/// Default PowerShell host binary.
pub const DEFAULT_POWERSHELL_HOST: &str = "pwsh";

/// Executor for PowerShell scripts.
#[derive(Debug, Clone)]
pub struct PowerShellExecutor {
    host: String,
}

impl PowerShellExecutor {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    /// Arguments passed to the PowerShell host for `script_path`.
    fn args(script_path: &str) -> [&str; 6] {
        [
            "-NoProfile",
            "-NonInteractive",
            "-ExecutionPolicy",
            "Bypass",
            "-File",
            script_path,
        ]
    }
}

impl Default for PowerShellExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_POWERSHELL_HOST)
    }
}

impl ScriptExecutor for PowerShellExecutor {
    async fn execute(
        &self,
        script_path: &str,
        input: ScriptInput,
    ) -> Result<ScriptOutput, ScriptError> {
        subprocess::ensure_script_exists(script_path).await?;
        let mut cmd = tokio::process::Command::new(&self.host);
        cmd.args(Self::args(script_path));
        subprocess::run_command(&mut cmd, input).await
    }
}
