//! Configuration file support.
//!
//! Configuration is loaded from:
//! 1. An explicit path given via `--config`
//! 2. `~/.config/proxy-tools/config.toml`
//! 3. Built-in defaults
//!
//! Every field has a default, so a partial file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_EXECUTOR_NAME: &str = "proxy";
pub const DEFAULT_RELEASE_STEPS: [&str; 2] = ["dev tag", "dev build_docker_image"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error in '{}': {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReleaseConfig {
    #[serde(default = "default_release_name")]
    pub name: String,

    #[serde(default = "default_release_steps")]
    pub steps: Vec<String>,
}

fn default_release_name() -> String {
    DEFAULT_EXECUTOR_NAME.to_string()
}

fn default_release_steps() -> Vec<String> {
    DEFAULT_RELEASE_STEPS.iter().map(|s| s.to_string()).collect()
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            name: default_release_name(),
            steps: default_release_steps(),
        }
    }
}

/// Rolling deploy settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeployConfig {
    /// Nodes file, one host per line (default: `nodes`).
    #[serde(default = "default_nodes_file")]
    pub nodes_file: PathBuf,

    /// Port the proxy listens on (default: 7000).
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_healthcheck_path")]
    pub healthcheck_path: String,

    /// Seconds to wait for a node to report healthy (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Seconds between healthcheck attempts (default: 1).
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Script invoked over ssh on every node (default: `./deploy-proxy.sh`).
    #[serde(default = "default_deploy_script")]
    pub deploy_script: String,
}

fn default_nodes_file() -> PathBuf {
    PathBuf::from("nodes")
}

fn default_port() -> u16 {
    7000
}

fn default_healthcheck_path() -> String {
    "/_internal_/healthcheck".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_interval_secs() -> u64 {
    1
}

fn default_deploy_script() -> String {
    "./deploy-proxy.sh".to_string()
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            nodes_file: default_nodes_file(),
            port: default_port(),
            healthcheck_path: default_healthcheck_path(),
            timeout_secs: default_timeout_secs(),
            interval_secs: default_interval_secs(),
            deploy_script: default_deploy_script(),
        }
    }
}

/// Smoke test settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmokeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_parent_organization")]
    pub parent_organization: String,

    #[serde(default = "default_test_org_prefix")]
    pub test_org_prefix: String,

    /// Defaults to `~/.flow/<parent_organization>` when unset.
    #[serde(default)]
    pub api_key_file: Option<PathBuf>,

    /// Seconds to wait for a new organization to reach the session service.
    #[serde(default = "default_propagation_wait_secs")]
    pub propagation_wait_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:7000".to_string()
}

fn default_parent_organization() -> String {
    "flow".to_string()
}

fn default_test_org_prefix() -> String {
    "proxy-test".to_string()
}

fn default_propagation_wait_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            parent_organization: default_parent_organization(),
            test_org_prefix: default_test_org_prefix(),
            api_key_file: None,
            propagation_wait_secs: default_propagation_wait_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub release: ReleaseConfig,

    #[serde(default)]
    pub deploy: DeployConfig,

    #[serde(default)]
    pub smoke: SmokeConfig,
}

impl Config {
    /// Loads the explicit path (which must exist), else the default path if present.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) if !p.exists() => return Err(ConfigError::NotFound(p.to_path_buf())),
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) if p.exists() => p,
                _ => {
                    tracing::debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
            },
        };
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&raw).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

pub fn config_dir() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".config").join("proxy-tools"))
}

fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}
