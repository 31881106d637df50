// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution with timeouts.

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Default timeout for git worktree and branch commands
pub const GIT_WORKTREE_TIMEOUT: Duration = Duration::from_secs(60);

/// Run a command to completion, killing it if `timeout` elapses.
///
/// Spawn failures and timeouts are reported as a message naming
/// `description`; a non-zero exit is returned as a normal `Output`.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(format!("{description} failed to run: {e}")),
        Err(_) => Err(format!("{description} timed out after {}s", timeout.as_secs_f64())),
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
