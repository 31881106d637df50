// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lane manager configuration.
//!
//! Layered in increasing precedence: built-in defaults, the `[lanes]`
//! table of a TOML file, then `HELIOS_*` environment variables.
//!
//! ```toml
//! [lanes]
//! capacity = 20
//! lock_timeout_ms = 2000
//! git_timeout_ms = 30000
//! reconcile_timeout_ms = 10000
//! ```

use crate::env;
use crate::lock::DEFAULT_LOCK_TIMEOUT;
use crate::reconcile::DEFAULT_RECONCILE_TIMEOUT;
use crate::registry::DEFAULT_CAPACITY;
use helios_adapters::subprocess::GIT_WORKTREE_TIMEOUT;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("lane capacity must be at least 1")]
    InvalidCapacity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneConfig {
    /// Maximum number of lanes not yet closed
    pub capacity: usize,
    pub lock_timeout: Duration,
    pub git_timeout: Duration,
    /// Used when a reconciliation call does not pass its own timeout
    pub reconcile_timeout: Duration,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            git_timeout: GIT_WORKTREE_TIMEOUT,
            reconcile_timeout: DEFAULT_RECONCILE_TIMEOUT,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    lanes: LanesTable,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LanesTable {
    capacity: Option<usize>,
    lock_timeout_ms: Option<u64>,
    git_timeout_ms: Option<u64>,
    reconcile_timeout_ms: Option<u64>,
}

impl LaneConfig {
    /// Defaults overlaid with environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides().validate()
    }

    /// Defaults overlaid with a config file, then environment variables.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let config = Self::parse_toml(&content)?.with_env_overrides().validate()?;
        tracing::debug!(path = %path.display(), ?config, "loaded lane config");
        Ok(config)
    }

    /// Defaults overlaid with TOML content. Environment is not consulted.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse_toml(content)?.validate()
    }

    fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        let lanes = file.lanes;
        let defaults = Self::default();
        Ok(Self {
            capacity: lanes.capacity.unwrap_or(defaults.capacity),
            lock_timeout: lanes
                .lock_timeout_ms
                .map_or(defaults.lock_timeout, Duration::from_millis),
            git_timeout: lanes.git_timeout_ms.map_or(defaults.git_timeout, Duration::from_millis),
            reconcile_timeout: lanes
                .reconcile_timeout_ms
                .map_or(defaults.reconcile_timeout, Duration::from_millis),
        })
    }

    /// Apply any `HELIOS_*` variables that are set and parse.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(capacity) = env::lane_capacity() {
            self.capacity = capacity;
        }
        if let Some(timeout) = env::lock_timeout() {
            self.lock_timeout = timeout;
        }
        if let Some(timeout) = env::git_timeout() {
            self.git_timeout = timeout;
        }
        if let Some(timeout) = env::reconcile_timeout() {
            self.reconcile_timeout = timeout;
        }
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidCapacity);
        }
        Ok(self)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
