//! Bounded-timeout subprocess execution for CLI-backed providers.

use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use fleetkey_core::{Error, Result};

/// Run a subprocess to completion and capture trimmed stdout.
///
/// `label` is a redacted operation name (command plus subcommand words, never
/// the secret identifier) used in every error this function produces. The
/// child is killed when the timeout expires and a distinct timeout error is
/// surfaced instead of a generic exec failure.
pub(crate) async fn run_captured(
    program: &str,
    args: &[String],
    label: &str,
    timeout: Duration,
) -> Result<String> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Err(_) => return Err(Error::timeout(label, timeout)),
        Ok(Err(e)) => {
            return Err(Error::command_execution(
                label,
                Vec::new(),
                format!("failed to execute (is '{program}' installed and on PATH?): {e}"),
                None,
            ));
        }
        Ok(Ok(output)) => output,
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        let message = if stderr.is_empty() {
            "no output on stderr".to_string()
        } else {
            stderr.to_string()
        };
        return Err(Error::command_execution(
            label,
            Vec::new(),
            message,
            output.status.code(),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
