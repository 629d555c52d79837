//! Harness configuration file handling
//!
//! An optional `config.toml` overrides the agent control surface and the
//! per-pipeline tuning constants. Every field has a default so the harness
//! runs without any config file present.
//!
//! The tuning numbers (tolerances, retry budgets, settle delays) are carried
//! over verbatim from the historical values used against each pipeline; they
//! are named here rather than inlined at call sites.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Agent control surface settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Per-pipeline tuning constants
    #[serde(default)]
    pub pipelines: PipelineTuning,

    /// Metrics backend settings
    #[serde(default)]
    pub backend: BackendConfig,
}

/// Agent control surface: where configs are deployed and how the agent is
/// started and stopped on the local host.
#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    /// Well-known path the agent reads its configuration from
    #[serde(default = "default_config_output_path")]
    pub config_output_path: PathBuf,

    /// Command that starts the agent with the deployed config
    #[serde(default = "default_start_command")]
    pub start_command: String,

    /// Command that stops the agent
    #[serde(default = "default_stop_command")]
    pub stop_command: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            config_output_path: default_config_output_path(),
            start_command: default_start_command(),
            stop_command: default_stop_command(),
        }
    }
}

fn default_config_output_path() -> PathBuf {
    PathBuf::from("/opt/telemetry-agent/etc/config.json")
}
fn default_start_command() -> String {
    "sudo /opt/telemetry-agent/bin/agent-ctl -a start -c".to_string()
}
fn default_stop_command() -> String {
    "sudo /opt/telemetry-agent/bin/agent-ctl -a stop".to_string()
}

/// Tuning constants per metrics pipeline
///
/// The statsd pipeline aggregates more coarsely than the host pipeline, so
/// it historically runs with a looser tolerance band. The values are
/// preserved as-is.
#[derive(Debug, Deserialize, Clone)]
pub struct PipelineTuning {
    /// Tolerance band applied around expected means (fraction)
    #[serde(default = "default_tolerance")]
    pub default_tolerance: f64,

    /// Looser band for the statsd pipeline
    #[serde(default = "statsd_tolerance")]
    pub statsd_tolerance: f64,

    /// Validation retry attempts for eventually-consistent ingestion
    #[serde(default = "default_retry_attempts")]
    pub validate_retry_attempts: u32,

    /// Sleep between validation retry attempts, in seconds
    #[serde(default = "default_retry_interval")]
    pub validate_retry_interval_secs: u64,

    /// Settle delay after an ECS daemon service restart, in seconds.
    /// There is no synchronous "restart complete" signal, so this is a
    /// plain timed wait.
    #[serde(default = "default_ecs_settle")]
    pub ecs_restart_settle_secs: u64,
}

impl Default for PipelineTuning {
    fn default() -> Self {
        Self {
            default_tolerance: default_tolerance(),
            statsd_tolerance: statsd_tolerance(),
            validate_retry_attempts: default_retry_attempts(),
            validate_retry_interval_secs: default_retry_interval(),
            ecs_restart_settle_secs: default_ecs_settle(),
        }
    }
}

impl PipelineTuning {
    pub fn validate_retry_interval(&self) -> Duration {
        Duration::from_secs(self.validate_retry_interval_secs)
    }

    pub fn ecs_restart_settle(&self) -> Duration {
        Duration::from_secs(self.ecs_restart_settle_secs)
    }
}

fn default_tolerance() -> f64 {
    0.10
}
fn statsd_tolerance() -> f64 {
    0.20
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_retry_interval() -> u64 {
    15
}
fn default_ecs_settle() -> u64 {
    300
}

/// Metrics backend settings
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Base URL of the time-series query service
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:9050".to_string()
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "telemetry-harness")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if the file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                let content =
                    std::fs::read_to_string(&path).map_err(|e| Error::FileRead {
                        path: path.display().to_string(),
                        error: e.to_string(),
                    })?;
                return toml::from_str(&content)
                    .map_err(|e| Error::ConfigParse(e.to_string()));
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.pipelines.default_tolerance, 0.10);
        assert_eq!(config.pipelines.statsd_tolerance, 0.20);
        assert_eq!(config.pipelines.ecs_restart_settle_secs, 300);
        assert!(!config.agent.start_command.is_empty());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [pipelines]
            validate_retry_attempts = 6
            "#,
        )
        .unwrap();
        assert_eq!(config.pipelines.validate_retry_attempts, 6);
        assert_eq!(config.pipelines.validate_retry_interval_secs, 15);
    }
}
