//! Agent control surface
//!
//! Opaque lifecycle operations the run strategies depend on. Start must
//! report success or failure synchronously; stop and cleanup failures are
//! surfaced to the caller, never swallowed.

pub mod remote;

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

use crate::common::config::AgentConfig;
use crate::common::{Error, Result};

/// Lifecycle of the agent under test
#[async_trait]
pub trait AgentController: Send + Sync {
    /// Place the configuration artifact where the agent reads it
    async fn deploy(&self, config_artifact: &Path) -> Result<()>;

    /// Start the agent with the deployed configuration
    async fn start(&self) -> Result<()>;

    /// Stop the agent
    async fn stop(&self) -> Result<()>;

    /// Remove the deployed configuration so it cannot leak into the next run
    async fn cleanup(&self) -> Result<()>;
}

/// Controls an agent installed on the local host via its ctl commands
pub struct LocalAgent {
    config: AgentConfig,
}

impl LocalAgent {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    pub fn config_output_path(&self) -> &PathBuf {
        &self.config.config_output_path
    }

    async fn run_shell(command: &str) -> Result<()> {
        info!(command, "running agent control command");
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Internal(format!(
                "command '{}' exited with {:?}: {}",
                command,
                output.status.code(),
                stderr.trim()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl AgentController for LocalAgent {
    async fn deploy(&self, config_artifact: &Path) -> Result<()> {
        let target = &self.config.config_output_path;
        info!(from = %config_artifact.display(), to = %target.display(), "deploying agent config");
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::config_deploy(&config_artifact.display().to_string(), e)
            })?;
        }
        tokio::fs::copy(config_artifact, target)
            .await
            .map_err(|e| Error::config_deploy(&config_artifact.display().to_string(), e))?;
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        let command = format!(
            "{} {}",
            self.config.start_command,
            self.config.config_output_path.display()
        );
        Self::run_shell(&command)
            .await
            .map_err(|e| Error::AgentStartFailed(e.to_string()))
    }

    async fn stop(&self) -> Result<()> {
        Self::run_shell(&self.config.stop_command)
            .await
            .map_err(|e| Error::AgentStopFailed(e.to_string()))
    }

    async fn cleanup(&self) -> Result<()> {
        let target = &self.config.config_output_path;
        info!(path = %target.display(), "removing deployed agent config");
        tokio::fs::remove_file(target)
            .await
            .map_err(|e| Error::cleanup(&target.display().to_string(), e))
    }
}
