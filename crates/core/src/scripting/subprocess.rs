//! Shared subprocess plumbing for the script executors.
//!
//! Each executor builds a [`tokio::process::Command`] for its runtime and
//! hands it to [`run_command`], which owns stdin/stdout handling and the
//! timeout.

use std::process::Stdio;
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use super::executor::{ScriptError, ScriptInput, ScriptOutput};

/// Maximum bytes captured per output stream (4 MiB).
///
/// A full locked-out account listing for a large directory stays well below
/// this; anything longer is truncated.
const MAX_OUTPUT_BYTES: usize = 4 * 1024 * 1024;

/// Fail with [`ScriptError::NotFound`] unless `script_path` is a file.
pub async fn ensure_script_exists(script_path: &str) -> Result<(), ScriptError> {
    match tokio::fs::metadata(script_path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(ScriptError::NotFound(script_path.to_string())),
    }
}

/// Spawn `cmd`, pipe the JSON request to stdin, capture stdout/stderr and
/// enforce `input.timeout`.
///
/// On timeout the child is killed (`kill_on_drop`) and
/// [`ScriptError::Timeout`] is returned.
pub async fn run_command(
    cmd: &mut Command,
    input: ScriptInput,
) -> Result<ScriptOutput, ScriptError> {
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    for (key, value) in &input.env_vars {
        cmd.env(key, value);
    }
    if let Some(dir) = &input.working_directory {
        cmd.current_dir(dir);
    }

    let start = Instant::now();
    let mut child = cmd.spawn().map_err(ScriptError::IoError)?;

    if let Some(mut stdin) = child.stdin.take() {
        let payload = serde_json::to_vec(&input.data).unwrap_or_default();
        // The script may exit without reading stdin.
        let _ = stdin.write_all(&payload).await;
        drop(stdin);
    }

    let stdout_task = tokio::spawn(read_stream(child.stdout.take()));
    let stderr_task = tokio::spawn(read_stream(child.stderr.take()));

    match tokio::time::timeout(input.timeout, child.wait()).await {
        Ok(Ok(status)) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            let stdout_bytes = stdout_task.await.unwrap_or_default();
            let stderr_bytes = stderr_task.await.unwrap_or_default();
            let stdout = String::from_utf8_lossy(&stdout_bytes).into_owned();
            let stderr = String::from_utf8_lossy(&stderr_bytes).into_owned();
            let parsed_output = parse_json_output(&stdout);

            Ok(ScriptOutput {
                stdout,
                stderr,
                exit_code: status.code().unwrap_or(-1),
                duration_ms,
                parsed_output,
            })
        }
        Ok(Err(e)) => Err(ScriptError::IoError(e)),
        Err(_elapsed) => Err(ScriptError::Timeout {
            elapsed_ms: start.elapsed().as_millis() as u64,
        }),
    }
}

/// Parse script stdout as JSON, tolerating a UTF-8 BOM and surrounding
/// whitespace (Windows PowerShell emits both).
pub fn parse_json_output(stdout: &str) -> Option<serde_json::Value> {
    let trimmed = stdout.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    match handle {
        Some(h) => read_capped(h, MAX_OUTPUT_BYTES).await,
        None => Vec::new(),
    }
}

/// Keep the first `cap` bytes and drain the rest, so a chatty child never
/// blocks on a full pipe.
async fn read_capped<R: AsyncRead + Unpin>(mut reader: R, cap: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    let _ = (&mut reader).take(cap as u64).read_to_end(&mut buf).await;
    let _ = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await;
    buf
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
