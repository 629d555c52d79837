//! Concrete dimension providers
//!
//! Each provider resolves one well-known `Unknown` instruction key from the
//! environment metadata; the custom provider resolves every `Known`
//! instruction verbatim. Providers are filtered by applicability against the
//! compute type before the factory is built.

use crate::environment::{ComputeType, Metadata};

use super::{Dimension, DimensionProvider, ExpectedValue, Instruction};

/// Build the provider chain applicable to the current environment
pub fn applicable_providers(metadata: &Metadata) -> Vec<Box<dyn DimensionProvider>> {
    let all: Vec<Box<dyn DimensionProvider>> = vec![
        Box::new(EksClusterNameProvider),
        Box::new(HostProvider),
        Box::new(LocalInstanceIdProvider),
        Box::new(LocalImageIdProvider),
        Box::new(LocalInstanceTypeProvider),
        Box::new(EcsInstanceIdProvider),
        Box::new(CustomProvider),
    ];

    all.into_iter()
        .filter(|p| p.is_applicable(metadata))
        .collect()
}

fn non_empty(name: &str, value: &str) -> Option<Dimension> {
    if value.is_empty() {
        return None;
    }
    Some(Dimension {
        name: name.to_string(),
        value: value.to_string(),
    })
}

fn wants(instruction: &Instruction, key: &str) -> bool {
    instruction.key == key && !instruction.value.is_known()
}

/// Resolves any `Known` instruction to its literal value
pub struct CustomProvider;

impl DimensionProvider for CustomProvider {
    fn is_applicable(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn dimension(&self, instruction: &Instruction, _metadata: &Metadata) -> Option<Dimension> {
        match &instruction.value {
            ExpectedValue::Known(value) => Some(Dimension {
                name: instruction.key.clone(),
                value: value.clone(),
            }),
            ExpectedValue::Unknown => None,
        }
    }

    fn name(&self) -> &'static str {
        "CustomProvider"
    }
}

/// `InstanceId` on EC2, from the instance the harness runs on
pub struct LocalInstanceIdProvider;

impl DimensionProvider for LocalInstanceIdProvider {
    fn is_applicable(&self, metadata: &Metadata) -> bool {
        metadata.compute_type() == ComputeType::Ec2
    }

    fn dimension(&self, instruction: &Instruction, metadata: &Metadata) -> Option<Dimension> {
        if !wants(instruction, "InstanceId") {
            return None;
        }
        non_empty("InstanceId", &metadata.instance_id)
    }

    fn name(&self) -> &'static str {
        "LocalInstanceIdProvider"
    }
}

/// `InstanceType` on EC2
pub struct LocalInstanceTypeProvider;

impl DimensionProvider for LocalInstanceTypeProvider {
    fn is_applicable(&self, metadata: &Metadata) -> bool {
        metadata.compute_type() == ComputeType::Ec2
    }

    fn dimension(&self, instruction: &Instruction, metadata: &Metadata) -> Option<Dimension> {
        if !wants(instruction, "InstanceType") {
            return None;
        }
        non_empty("InstanceType", &metadata.instance_type)
    }

    fn name(&self) -> &'static str {
        "LocalInstanceTypeProvider"
    }
}

/// `ImageId` on EC2
pub struct LocalImageIdProvider;

impl DimensionProvider for LocalImageIdProvider {
    fn is_applicable(&self, metadata: &Metadata) -> bool {
        metadata.compute_type() == ComputeType::Ec2
    }

    fn dimension(&self, instruction: &Instruction, metadata: &Metadata) -> Option<Dimension> {
        if !wants(instruction, "ImageId") {
            return None;
        }
        non_empty("ImageId", &metadata.image_id)
    }

    fn name(&self) -> &'static str {
        "LocalImageIdProvider"
    }
}

/// `host` on EC2, from the local hostname
pub struct HostProvider;

impl DimensionProvider for HostProvider {
    fn is_applicable(&self, metadata: &Metadata) -> bool {
        metadata.compute_type() == ComputeType::Ec2
    }

    fn dimension(&self, instruction: &Instruction, metadata: &Metadata) -> Option<Dimension> {
        if !wants(instruction, "host") {
            return None;
        }
        if !metadata.hostname.is_empty() {
            return non_empty("host", &metadata.hostname);
        }
        let name = hostname()?;
        non_empty("host", &name)
    }

    fn name(&self) -> &'static str {
        "HostProvider"
    }
}

fn hostname() -> Option<String> {
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// `InstanceId` on ECS, from the container instance metadata
pub struct EcsInstanceIdProvider;

impl DimensionProvider for EcsInstanceIdProvider {
    fn is_applicable(&self, metadata: &Metadata) -> bool {
        metadata.compute_type() == ComputeType::Ecs
    }

    fn dimension(&self, instruction: &Instruction, metadata: &Metadata) -> Option<Dimension> {
        if !wants(instruction, "InstanceId") {
            return None;
        }
        non_empty("InstanceId", &metadata.instance_id)
    }

    fn name(&self) -> &'static str {
        "EcsInstanceIdProvider"
    }
}

/// `ClusterName` on EKS
pub struct EksClusterNameProvider;

impl DimensionProvider for EksClusterNameProvider {
    fn is_applicable(&self, metadata: &Metadata) -> bool {
        metadata.compute_type() == ComputeType::Eks
    }

    fn dimension(&self, instruction: &Instruction, metadata: &Metadata) -> Option<Dimension> {
        if !wants(instruction, "ClusterName") {
            return None;
        }
        non_empty("ClusterName", &metadata.eks_cluster_name)
    }

    fn name(&self) -> &'static str {
        "EksClusterNameProvider"
    }
}
