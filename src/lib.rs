//! telemetry-harness - end-to-end validation for a telemetry agent
//!
//! Drives an installed telemetry agent through configuration changes on
//! EC2/ECS/EKS hosts, waits out a data-collection window, and validates the
//! emitted metrics against a time-series query backend.

pub mod agent;
pub mod backend;
pub mod cli;
pub mod common;
pub mod dimension;
pub mod environment;
pub mod generator;
pub mod metric;
pub mod runner;
pub mod status;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use status::{TestGroupResult, TestResult, TestStatus, TestSuiteResult};
