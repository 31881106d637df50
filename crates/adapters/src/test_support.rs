// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scratch git repositories for tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use std::io;
use std::path::Path;
use std::process::Command;

fn git(repo: &Path, args: &[&str]) -> io::Result<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(["-c", "user.name=helios-test", "-c", "user.email=helios@test.invalid"])
        .args(["-c", "commit.gpgsign=false"])
        .args(args)
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE")
        .output()?;
    if !output.status.success() {
        return Err(io::Error::other(format!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Initialise a repository at `repo` with one commit on branch `main`.
pub fn init_repo(repo: &Path) -> io::Result<()> {
    std::fs::create_dir_all(repo)?;
    git(repo, &["init", "--quiet"])?;
    git(repo, &["symbolic-ref", "HEAD", "refs/heads/main"])?;
    std::fs::write(repo.join("README.md"), "scratch\n")?;
    git(repo, &["add", "README.md"])?;
    git(repo, &["commit", "--quiet", "-m", "init"])?;
    Ok(())
}

/// Local branch names in `repo` matching `pattern`.
pub fn branches(repo: &Path, pattern: &str) -> io::Result<Vec<String>> {
    let out = git(repo, &["branch", "--list", "--format=%(refname:short)", pattern])?;
    Ok(out.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from).collect())
}

/// Create a branch at HEAD without checking it out.
pub fn create_branch(repo: &Path, name: &str) -> io::Result<()> {
    git(repo, &["branch", name]).map(|_| ())
}
