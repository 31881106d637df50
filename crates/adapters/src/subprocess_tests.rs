// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn returns_output_of_successful_command() {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", "echo hello"]);
    let output = run_with_timeout(cmd, Duration::from_secs(5), "echo").await.unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
}

#[tokio::test]
async fn non_zero_exit_is_not_an_error() {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", "echo oops >&2; exit 3"]);
    let output = run_with_timeout(cmd, Duration::from_secs(5), "failing").await.unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(String::from_utf8_lossy(&output.stderr).trim(), "oops");
}

#[tokio::test]
async fn timeout_names_the_command() {
    let mut cmd = Command::new("sleep");
    cmd.arg("5");
    let err = run_with_timeout(cmd, Duration::from_millis(50), "sleepy").await.unwrap_err();
    assert!(err.contains("sleepy timed out"), "{err}");
}

#[tokio::test]
async fn missing_binary_is_reported() {
    let cmd = Command::new("helios-definitely-not-a-binary");
    let err = run_with_timeout(cmd, Duration::from_secs(5), "ghost").await.unwrap_err();
    assert!(err.contains("ghost failed to run"), "{err}");
}
