//! Running command steps as subprocesses.

use crate::error::{ChainError, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Captured result of a successful command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run `argv` and capture its output.
///
/// The first element is the program; no shell is involved, so arguments
/// are passed through exactly as rendered. Stdin is closed. A non-zero
/// exit fails with [`ChainError::CommandFailed`] carrying the status and
/// captured stderr. With a `timeout`, an overrunning process is killed and
/// [`ChainError::CommandTimeout`] is returned.
pub async fn run_command(argv: &[String], timeout: Option<Duration>) -> Result<CommandOutput> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| ChainError::InvalidConfig("command must not be empty".to_string()))?;

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ChainError::Spawn {
            program: program.clone(),
            source,
        })?;

    let waited = match timeout {
        Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
            .await
            .map_err(|_| ChainError::CommandTimeout {
                program: program.clone(),
                timeout: limit,
            })?,
        None => child.wait_with_output().await,
    };
    let output = waited.map_err(|source| ChainError::Spawn {
        program: program.clone(),
        source,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        return Err(ChainError::CommandFailed {
            program: program.clone(),
            status: output.status.code(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(CommandOutput { stdout, stderr })
}
