//! Declarative dimension resolution
//!
//! Tests declare the dimensions they expect on a metric as `Instruction`s:
//! either an exact expected value, or "resolve from the environment" (e.g.
//! the current instance id). Resolution is the only way a `Dimension` is
//! produced, so query dimensions can never drift from what the environment
//! actually reports.
//!
//! Dimensions are a conjunction: if any instruction stays unresolved the
//! caller must treat the whole metric check as failed and skip the fetch.

mod providers;

pub use providers::applicable_providers;

use crate::environment::Metadata;

/// Expected value policy for one dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedValue {
    /// Exact literal the dimension must carry
    Known(String),
    /// Value must be supplied by the environment (instance id, cluster name)
    Unknown,
}

impl ExpectedValue {
    pub fn known(value: impl Into<String>) -> Self {
        ExpectedValue::Known(value.into())
    }

    pub fn is_known(&self) -> bool {
        matches!(self, ExpectedValue::Known(_))
    }
}

/// Declarative request for one dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub key: String,
    pub value: ExpectedValue,
}

impl Instruction {
    pub fn known(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: ExpectedValue::Known(value.into()),
        }
    }

    pub fn unknown(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: ExpectedValue::Unknown,
        }
    }
}

/// Concrete backend-facing key/value pair
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Dimension {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value")]
    pub value: String,
}

/// Resolves one instruction from environment knowledge
///
/// A provider returns `None` when the instruction is outside its domain;
/// the factory falls through to the next provider in the chain.
pub trait DimensionProvider: Send + Sync {
    /// Whether this provider applies to the current environment at all
    fn is_applicable(&self, metadata: &Metadata) -> bool;

    /// Resolve the instruction, if this provider knows how
    fn dimension(&self, instruction: &Instruction, metadata: &Metadata) -> Option<Dimension>;

    fn name(&self) -> &'static str;
}

/// Chain of applicable providers for the current environment
pub struct DimensionFactory {
    metadata: Metadata,
    providers: Vec<Box<dyn DimensionProvider>>,
}

impl DimensionFactory {
    /// Build a factory from the providers applicable to `metadata`
    pub fn new(metadata: Metadata) -> Self {
        let providers = applicable_providers(&metadata);
        Self {
            metadata,
            providers,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_providers(
        metadata: Metadata,
        providers: Vec<Box<dyn DimensionProvider>>,
    ) -> Self {
        Self {
            metadata,
            providers,
        }
    }

    /// Resolve a list of instructions into concrete dimensions
    ///
    /// The returned dimensions mirror the order of the instructions. Any
    /// instruction no provider could satisfy is returned in the second list;
    /// a non-empty unresolved list means the dimension set must not be used
    /// for a fetch.
    pub fn resolve(&self, instructions: &[Instruction]) -> (Vec<Dimension>, Vec<Instruction>) {
        let mut dimensions = Vec::with_capacity(instructions.len());
        let mut unresolved = Vec::new();

        for instruction in instructions {
            match self.execute(instruction) {
                Some(dim) => {
                    tracing::debug!(name = %dim.name, value = %dim.value, "resolved dimension");
                    dimensions.push(dim);
                }
                None => {
                    tracing::warn!(key = %instruction.key, "unresolved dimension instruction");
                    unresolved.push(instruction.clone());
                }
            }
        }

        (dimensions, unresolved)
    }

    fn execute(&self, instruction: &Instruction) -> Option<Dimension> {
        for provider in &self.providers {
            if let Some(dim) = provider.dimension(instruction, &self.metadata) {
                tracing::debug!(provider = provider.name(), key = %instruction.key, "provider resolved instruction");
                return Some(dim);
            }
        }
        None
    }
}
