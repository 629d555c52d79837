//! Remote control-plane collaborators for the ECS strategy
//!
//! The harness pushes agent configuration through a parameter store entry
//! and restarts the managed daemon service. Both are behind traits so tests
//! can substitute fakes; the shipped implementations shell out to the `aws`
//! CLI, which the integration hosts already carry.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

use crate::common::{Error, Result};

/// Remote key/value parameter storage
#[async_trait]
pub trait ParameterStore: Send + Sync {
    async fn put_parameter(&self, name: &str, value: &str) -> Result<()>;
    async fn get_parameter(&self, name: &str) -> Result<String>;
}

/// Managed-service restart surface
#[async_trait]
pub trait ServiceControl: Send + Sync {
    /// Trigger a restart of the daemon service. Fire-and-forget: there is no
    /// synchronous "restart complete" signal to wait on.
    async fn restart_daemon_service(&self, cluster_arn: &str, service_name: &str) -> Result<()>;
}

/// `aws` CLI-backed implementation of both control-plane traits
pub struct AwsCli {
    binary: PathBuf,
    region: String,
}

impl AwsCli {
    /// Locate the `aws` binary on PATH
    pub fn discover(region: impl Into<String>) -> Result<Self> {
        let binary = which::which("aws").map_err(|_| Error::AwsCliNotFound)?;
        Ok(Self {
            binary,
            region: region.into(),
        })
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        info!(?args, "invoking aws cli");
        let output = Command::new(&self.binary)
            .args(args)
            .args(["--region", &self.region])
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Internal(format!(
                "aws {} exited with {:?}: {}",
                args.first().unwrap_or(&""),
                output.status.code(),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl ParameterStore for AwsCli {
    async fn put_parameter(&self, name: &str, value: &str) -> Result<()> {
        self.run(&[
            "ssm",
            "put-parameter",
            "--name",
            name,
            "--type",
            "String",
            "--overwrite",
            "--value",
            value,
        ])
        .await
        .map_err(|e| Error::parameter_put(name, e))?;
        Ok(())
    }

    async fn get_parameter(&self, name: &str) -> Result<String> {
        let stdout = self
            .run(&[
                "ssm",
                "get-parameter",
                "--name",
                name,
                "--query",
                "Parameter.Value",
                "--output",
                "text",
            ])
            .await?;
        Ok(stdout.trim_end_matches('\n').to_string())
    }
}

#[async_trait]
impl ServiceControl for AwsCli {
    async fn restart_daemon_service(&self, cluster_arn: &str, service_name: &str) -> Result<()> {
        self.run(&[
            "ecs",
            "update-service",
            "--cluster",
            cluster_arn,
            "--service",
            service_name,
            "--force-new-deployment",
        ])
        .await
        .map_err(|e| Error::service_restart(cluster_arn, service_name, e))?;
        Ok(())
    }
}
