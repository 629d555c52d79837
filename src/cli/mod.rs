//! Command-line interface
//!
//! Everything environment-specific arrives as flags from the CI job that
//! provisioned the host: the compute platform, the identity of the instance
//! or cluster under test, and which test groups to run. The flags are folded
//! into one `Metadata` value at startup.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::common::Result;
use crate::environment::{ComputeType, Metadata};

#[derive(Parser, Debug)]
#[command(
    name = "telemetry-harness",
    version,
    about = "End-to-end validation harness for the telemetry agent"
)]
pub struct Cli {
    /// Compute platform the agent runs on: EC2, ECS, or EKS
    #[arg(long, default_value = "EC2")]
    pub compute_type: String,

    /// Region passed to remote control-plane calls
    #[arg(long, default_value = "us-west-2")]
    pub region: String,

    /// Metric namespace the agent under test writes into
    #[arg(long, default_value = "TelemetryAgentHarness")]
    pub namespace: String,

    /// Instance id of the host (or container instance) under test
    #[arg(long, default_value = "")]
    pub instance_id: String,

    /// Instance type of the host under test
    #[arg(long, default_value = "")]
    pub instance_type: String,

    /// Image id the host was launched from
    #[arg(long, default_value = "")]
    pub image_id: String,

    /// Hostname override; read from the kernel when empty
    #[arg(long, default_value = "")]
    pub hostname: String,

    /// ECS cluster ARN hosting the agent daemon service
    #[arg(long, default_value = "")]
    pub cluster_arn: String,

    /// ECS daemon service name to restart on config changes
    #[arg(long, default_value = "")]
    pub service_name: String,

    /// Parameter store entry agent configs are pushed through on ECS
    #[arg(long, default_value = "")]
    pub config_parameter_name: String,

    /// EKS cluster name the agent is deployed to
    #[arg(long, default_value = "")]
    pub eks_cluster_name: String,

    /// Test group to run; repeatable. All groups run when omitted.
    #[arg(long = "test")]
    pub tests: Vec<String>,

    /// Override every runner's data-collection dwell, in seconds
    #[arg(long)]
    pub run_duration_secs: Option<u64>,

    /// Directory holding the agent config artifacts the runners deploy
    #[arg(long)]
    pub agent_config_dir: Option<PathBuf>,

    /// Harness config file (defaults to the per-user config location)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Fold the environment flags into the metadata the suite runs against
    pub fn metadata(&self) -> Result<Metadata> {
        let compute_type: ComputeType = self.compute_type.parse()?;
        Ok(Metadata {
            compute_type: Some(compute_type),
            region: self.region.clone(),
            instance_id: self.instance_id.clone(),
            instance_type: self.instance_type.clone(),
            image_id: self.image_id.clone(),
            hostname: self.hostname.clone(),
            ecs_cluster_arn: self.cluster_arn.clone(),
            ecs_cluster_name: Metadata::cluster_name_from_arn(&self.cluster_arn).to_string(),
            ecs_service_name: self.service_name.clone(),
            config_parameter_name: self.config_parameter_name.clone(),
            eks_cluster_name: self.eks_cluster_name.clone(),
        })
    }

    /// Whether a test group was selected (all groups when none named)
    pub fn selected(&self, name: &str) -> bool {
        self.tests.is_empty() || self.tests.iter().any(|t| t == name)
    }

    /// Path to a named agent config artifact, if a config dir was given
    pub fn agent_config(&self, file_name: &str) -> Option<PathBuf> {
        self.agent_config_dir.as_ref().map(|dir| dir.join(file_name))
    }

    pub fn run_duration_override(&self) -> Option<Duration> {
        self.run_duration_secs.map(Duration::from_secs)
    }
}
