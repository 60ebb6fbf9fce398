//! Configuration loading and management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What a store does after a successful mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Refetch the unfiltered list before the mutation call returns
    #[default]
    Await,
    /// Refetch on a spawned task; the mutation call returns immediately
    Spawn,
    /// Never refetch; the caller decides
    Manual,
}

/// Behaviour shared by every entity store of a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Follow-up list fetch after create/update/partial update/delete
    #[serde(default)]
    pub refresh: RefreshPolicy,

    /// Drop list responses older than the last applied one
    #[serde(default = "default_true")]
    pub fence_stale_lists: bool,

    /// Check record constraints before create and full update
    #[serde(default = "default_true")]
    pub validate_before_send: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            refresh: RefreshPolicy::default(),
            fence_stale_lists: true,
            validate_before_send: true,
        }
    }
}

/// Complete client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend origin, e.g. `http://localhost:8080`
    pub base_url: String,

    /// Path prefix of the REST resources
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub store: StoreConfig,
}

fn default_true() -> bool {
    true
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl ClientConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path))?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a working client
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            anyhow::bail!("base_url must be an http(s) URL, got '{}'", self.base_url);
        }
        if !self.api_prefix.starts_with('/') {
            anyhow::bail!("api_prefix must start with '/', got '{}'", self.api_prefix);
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be positive");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Create a default configuration for local development and testing
    pub fn default_config() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_prefix: default_api_prefix(),
            timeout_secs: default_timeout_secs(),
            store: StoreConfig::default(),
        }
    }
}
