//! Deployment environment metadata
//!
//! A `Metadata` value is built once at suite start from CLI flags and passed
//! by reference into the orchestrator, run strategies, and dimension
//! providers. There is no package-level environment state.

use std::fmt;
use std::str::FromStr;

use crate::common::Error;

/// Compute platform the agent under test runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeType {
    Ec2,
    Ecs,
    Eks,
}

impl FromStr for ComputeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EC2" => Ok(ComputeType::Ec2),
            "ECS" => Ok(ComputeType::Ecs),
            "EKS" => Ok(ComputeType::Eks),
            other => Err(Error::Config(format!(
                "invalid compute type '{other}', expected EC2/ECS/EKS"
            ))),
        }
    }
}

impl fmt::Display for ComputeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputeType::Ec2 => write!(f, "EC2"),
            ComputeType::Ecs => write!(f, "ECS"),
            ComputeType::Eks => write!(f, "EKS"),
        }
    }
}

/// Ambient facts about the deployment the suite runs against
///
/// Fields that don't apply to the current compute type stay empty; dimension
/// providers gate on `compute_type` before consulting them.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub compute_type: Option<ComputeType>,
    pub region: String,

    // EC2
    pub instance_id: String,
    pub instance_type: String,
    pub image_id: String,
    pub hostname: String,

    // ECS
    pub ecs_cluster_arn: String,
    pub ecs_cluster_name: String,
    pub ecs_service_name: String,
    /// Parameter store entry the ECS strategy writes agent config into
    pub config_parameter_name: String,

    // EKS
    pub eks_cluster_name: String,
}

impl Metadata {
    pub fn compute_type(&self) -> ComputeType {
        self.compute_type.unwrap_or(ComputeType::Ec2)
    }

    /// Cluster name portion of an ECS cluster ARN
    /// (`arn:aws:ecs:...:cluster/name` -> `name`)
    pub fn cluster_name_from_arn(arn: &str) -> &str {
        arn.rsplit('/').next().unwrap_or(arn)
    }
}
